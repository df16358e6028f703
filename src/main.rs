use clap::{arg,crate_version,ArgAction,ArgMatches,Command};
use std::io::{Cursor,Read,Write};
use statichuff::{huff,STD_OPTIONS};
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

/// permission bits stored when the input is not a file
const STDIN_PERMISSIONS: u16 = 0o644;

fn ok_to_overwrite(path_out: &str) -> bool {
    if let Ok(_f) = std::fs::File::open(path_out) {
        let mut ans = String::new();
        eprint!("{} exists, overwrite? (y/n) ",path_out);
        if std::io::stdin().read_line(&mut ans).is_err() {
            return false;
        }
        return ans.trim_end()=="y" || ans.trim_end()=="Y";
    }
    true
}

/// Whole input as a seekable object, either the named file or everything on stdin,
/// along with its permission bits.
fn open_input(path_in: Option<&String>) -> Result<(Box<dyn ReadSeek>,u16),Box<dyn std::error::Error>> {
    match path_in {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            let permissions = file_permissions(&file.metadata()?);
            Ok((Box::new(file),permissions))
        },
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok((Box::new(Cursor::new(buf)),STDIN_PERMISSIONS))
        }
    }
}

trait ReadSeek: std::io::Read + std::io::Seek {}
impl <T: std::io::Read + std::io::Seek> ReadSeek for T {}

#[cfg(unix)]
fn file_permissions(meta: &std::fs::Metadata) -> u16 {
    use std::os::unix::fs::PermissionsExt;
    (meta.permissions().mode() & 0o777) as u16
}

#[cfg(not(unix))]
fn file_permissions(_meta: &std::fs::Metadata) -> u16 {
    STDIN_PERMISSIONS
}

#[cfg(unix)]
fn set_file_permissions(path: &str,permissions: u16) -> STDRESULT {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path,std::fs::Permissions::from_mode(permissions as u32 & 0o777))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &str,_permissions: u16) -> STDRESULT {
    Ok(())
}

fn percent_gain(numerator: u64,denominator: u64) -> f64 {
    match denominator {
        0 => 0.0,
        d => (1.0 - numerator as f64 / d as f64) * 100.0
    }
}

/// Run one subcommand.  Output is held in memory until the operation succeeds,
/// so a failed run leaves an existing output file untouched.
fn run(cmd: &ArgMatches,compressing: bool) -> STDRESULT {
    let path_in = cmd.get_one::<String>("input");
    let path_out = cmd.get_one::<String>("output");
    let verbose = cmd.get_flag("verbose");
    let force = cmd.get_flag("force");
    if let Some(path) = path_out {
        if !force && path_in.is_none() && std::path::Path::new(path).exists() {
            // stdin carries the data, so it cannot also carry the answer
            log::error!("{} exists, use --force to overwrite when reading stdin",path);
            return Err(Box::new(std::io::Error::from(std::io::ErrorKind::AlreadyExists)));
        }
        if !force && !ok_to_overwrite(path) {
            eprintln!("abort operation");
            return Ok(());
        }
    }
    let (mut reader,in_permissions) = open_input(path_in)?;
    let mut obuf: Vec<u8> = Vec::new();
    let (in_size,out_size,permissions) = match compressing {
        true => {
            let (i,o) = huff::compress(&mut reader,&mut obuf,in_permissions,&STD_OPTIONS)?;
            (i,o,in_permissions)
        },
        false => huff::expand(&mut reader,&mut obuf,&STD_OPTIONS)?
    };
    match path_out {
        Some(path) => {
            let mut out_file = std::fs::OpenOptions::new().write(true).truncate(false).create(true).open(path)?;
            out_file.write_all(&obuf)?;
            out_file.set_len(out_size)?;
            set_file_permissions(path,permissions)?;
        },
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&obuf)?;
            stdout.flush()?;
        }
    }
    log::info!("{} {} into {}",if compressing {"compressed"} else {"expanded"},in_size,out_size);
    if verbose {
        match compressing {
            true => {
                eprintln!("Uncompressed file size = {} bytes",in_size);
                eprintln!("Compressed file size = {} bytes",out_size);
                eprintln!("Compression gain = {:0.2}%",percent_gain(out_size,in_size));
            },
            false => {
                eprintln!("Compressed file size = {} bytes",in_size);
                eprintln!("Decompressed file size = {} bytes",out_size);
                eprintln!("Decompression size change = {:0.2}%",percent_gain(in_size,out_size));
            }
        }
    }
    Ok(())
}

fn main() -> STDRESULT
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let long_help =
"Examples:
---------
Compress:      `statichuff compress -i my_expanded -o my_compressed`
Expand:        `statichuff expand -i my_compressed -o my_expanded`
Pipe:          `cat my_expanded | statichuff compress > my_compressed`";

    let mut main_cmd = Command::new("statichuff")
        .about("Compress and expand with a static Huffman code")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(Command::new("compress")
        .arg(arg!(-i --input <PATH> "input path, default is stdin").required(false))
        .arg(arg!(-o --output <PATH> "output path, default is stdout").required(false))
        .arg(arg!(-v --verbose "print compression statistics to stderr").action(ArgAction::SetTrue))
        .arg(arg!(-f --force "overwrite output without asking").action(ArgAction::SetTrue))
        .about("compress a file"));

    main_cmd = main_cmd.subcommand(Command::new("expand")
        .arg(arg!(-i --input <PATH> "input path, default is stdin").required(false))
        .arg(arg!(-o --output <PATH> "output path, default is stdout").required(false))
        .arg(arg!(-v --verbose "print compression statistics to stderr").action(ArgAction::SetTrue))
        .arg(arg!(-f --force "overwrite output without asking").action(ArgAction::SetTrue))
        .about("expand a file"));

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        run(cmd,true)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        run(cmd,false)?;
    }

    Ok(())
}
