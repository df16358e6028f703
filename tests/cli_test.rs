use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::path::Path;
use std::process::Command; // Run programs
use tempfile;
type STDRESULT = Result<(),Box<dyn std::error::Error>>;

const SAMPLE: &str = "I am Sam. Sam I am. I do not like this Sam I am.\n\
Do you like green eggs and ham?\n\
I do not like them, Sam I am.\n\
I do not like green eggs and ham.\n";

fn compress_file(in_path: &Path,out_path: &Path) -> STDRESULT {
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("compress")
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success();
    Ok(())
}

fn expand_file(in_path: &Path,out_path: &Path) -> STDRESULT {
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("expand")
        .arg("-i").arg(in_path)
        .arg("-o").arg(out_path)
        .assert()
        .success();
    Ok(())
}

fn round_trip_test(dat: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("original.txt");
    let cmp_path = temp_dir.path().join("original.huf");
    let out_path = temp_dir.path().join("expanded.txt");
    std::fs::write(&in_path,dat)?;
    compress_file(&in_path,&cmp_path)?;
    expand_file(&cmp_path,&out_path)?;
    match (std::fs::read(in_path),std::fs::read(out_path)) {
        (Ok(v1),Ok(v2)) => {
            assert_eq!(v1,v2);
        },
        _ => panic!("unable to compare output with reference")
    }
    Ok(())
}

#[test]
fn text_round_trip() -> STDRESULT {
    round_trip_test(SAMPLE.as_bytes())
}

#[test]
fn empty_round_trip() -> STDRESULT {
    round_trip_test(&[])
}

#[test]
fn binary_round_trip() -> STDRESULT {
    let dat: Vec<u8> = (0..20000usize).map(|i| ((i * 31) ^ (i >> 3)) as u8).collect();
    round_trip_test(&dat)
}

#[test]
fn compressed_is_smaller() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("sample.txt");
    let cmp_path = temp_dir.path().join("sample.huf");
    std::fs::write(&in_path,SAMPLE.repeat(20))?;
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("compress")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&cmp_path)
        .arg("-v")
        .assert()
        .success()
        .stderr(predicate::str::contains("Compression gain"));
    let in_len = std::fs::metadata(&in_path)?.len();
    let cmp_len = std::fs::metadata(&cmp_path)?.len();
    assert!(cmp_len < in_len);
    Ok(())
}

#[test]
fn pipe_round_trip() -> STDRESULT {
    let compressed = assert_cmd::Command::cargo_bin("statichuff")?
        .arg("compress")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(&compressed[0..4],&[0xAD,0xBB,0xEF,0xBE]);
    assert_cmd::Command::cargo_bin("statichuff")?
        .arg("expand")
        .write_stdin(compressed)
        .assert()
        .success()
        .stdout(SAMPLE);
    Ok(())
}

#[test]
fn bad_magic_is_rejected() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("bogus.huf");
    let out_path = temp_dir.path().join("bogus.txt");
    std::fs::write(&in_path,"this is not a compressed file")?;
    let mut cmd = Command::cargo_bin("statichuff")?;
    cmd.arg("expand")
        .arg("-i").arg(&in_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("FileFormatMismatch"));
    assert!(!out_path.exists());
    Ok(())
}

#[test]
fn truncated_data_is_rejected() -> STDRESULT {
    let compressed = assert_cmd::Command::cargo_bin("statichuff")?
        .arg("compress")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let short = compressed[0..compressed.len()-3].to_vec();
    assert_cmd::Command::cargo_bin("statichuff")?
        .arg("expand")
        .write_stdin(short)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("UnexpectedEnd"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn permissions_are_propagated() -> STDRESULT {
    use std::os::unix::fs::PermissionsExt;
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("script.sh");
    let cmp_path = temp_dir.path().join("script.huf");
    let out_path = temp_dir.path().join("script_copy.sh");
    std::fs::write(&in_path,"#!/bin/sh\necho hello\n")?;
    std::fs::set_permissions(&in_path,std::fs::Permissions::from_mode(0o750))?;
    compress_file(&in_path,&cmp_path)?;
    expand_file(&cmp_path,&out_path)?;
    let mode = std::fs::metadata(&out_path)?.permissions().mode() & 0o777;
    assert_eq!(mode,0o750);
    Ok(())
}

#[test]
fn stdin_input_does_not_prompt() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let out_path = temp_dir.path().join("existing.huf");
    std::fs::write(&out_path,"keep me")?;
    assert_cmd::Command::cargo_bin("statichuff")?
        .arg("compress")
        .arg("-o").arg(&out_path)
        .write_stdin("y\nmore data\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(std::fs::read(&out_path)?,"keep me".as_bytes().to_vec());
    assert_cmd::Command::cargo_bin("statichuff")?
        .arg("compress")
        .arg("-f")
        .arg("-o").arg(&out_path)
        .write_stdin("y\nmore data\n")
        .assert()
        .success();
    let compressed = std::fs::read(&out_path)?;
    assert_eq!(&compressed[0..4],&[0xAD,0xBB,0xEF,0xBE]);
    Ok(())
}
