use std::{fs, path::Path, process};

use anyhow::Context;
use clap::Parser;
use rawdex::{
    domain::Diagnostics,
    storage::{codec, RawFile},
    Namespace, Registry, Strictness,
};
use tracing::instrument;

use super::{terminal::Colorize, Raws};

#[derive(Debug, Parser)]
#[command(about = "Verify that every raw file survives a parse and rewrite unchanged")]
pub struct Check {
    /// Only print failures
    #[arg(long)]
    quiet: bool,
}

/// Where a file's rewrite first diverged from its content.
#[derive(Debug)]
enum Outcome {
    Ok,
    Codec(usize),
    Namespace(usize),
    Unencodable(String),
}

impl Check {
    #[instrument(level = "debug", skip(self, raws))]
    pub fn run(self, raws: &Raws) -> anyhow::Result<()> {
        let paths = raws.directory().raw_files(raws.config());
        if paths.is_empty() {
            println!("No raw files found in {}.", raws.root().display());
            return Ok(());
        }

        let mut failures = 0;
        for path in &paths {
            let name = path
                .file_name()
                .map_or_else(String::new, |name| name.to_string_lossy().into_owned());

            match check_file(path)? {
                Outcome::Ok => {
                    if !self.quiet {
                        println!("{} {name}", "ok  ".success());
                    }
                }
                Outcome::Codec(offset) => {
                    failures += 1;
                    println!(
                        "{} {name}: token stream differs at byte {offset}",
                        "FAIL".failure()
                    );
                }
                Outcome::Namespace(offset) => {
                    failures += 1;
                    println!(
                        "{} {name}: records differ at byte {offset}",
                        "FAIL".failure()
                    );
                }
                Outcome::Unencodable(e) => {
                    failures += 1;
                    println!("{} {name}: {e}", "FAIL".failure());
                }
            }
        }

        if failures == 0 {
            println!("{} files round-trip unchanged ✅", paths.len().to_string().success());
            Ok(())
        } else {
            println!(
                "{} of {} files do not round-trip ⚠️",
                failures.to_string().warning(),
                paths.len()
            );
            process::exit(1);
        }
    }
}

/// Rewrites a file twice, from its token stream and from its records, and
/// compares both with the file content after CRLF normalisation.
fn check_file(path: &Path) -> anyhow::Result<Outcome> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let expected = codec::crlf(&bytes);

    let rewritten = match codec::unparse(&codec::parse(&bytes)) {
        Ok(rewritten) => rewritten,
        Err(e) => return Ok(Outcome::Unencodable(e.to_string())),
    };
    if let Some(offset) = first_difference(&rewritten, &expected) {
        return Ok(Outcome::Codec(offset));
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut diagnostics = Diagnostics::new(Strictness::Permissive);
    let raw = RawFile::parse(&bytes, &file_name, &mut diagnostics)?;
    let namespace = Namespace::new(raw, Registry::global(), &mut diagnostics)?;
    let rewritten = match namespace.to_bytes() {
        Ok(rewritten) => rewritten,
        Err(e) => return Ok(Outcome::Unencodable(e.to_string())),
    };
    Ok(first_difference(&rewritten, &expected).map_or(Outcome::Ok, Outcome::Namespace))
}

fn first_difference(a: &[u8], b: &[u8]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use test_case::test_case;

    use super::*;

    #[test_case(b"abc", b"abc", None; "identical")]
    #[test_case(b"abc", b"abd", Some(2); "differing byte")]
    #[test_case(b"ab", b"abc", Some(2); "first is shorter")]
    #[test_case(b"abcd", b"abc", Some(3); "first is longer")]
    #[test_case(b"", b"a", Some(0); "empty")]
    fn first_difference_offset(a: &[u8], b: &[u8], expected: Option<usize>) {
        assert_eq!(first_difference(a, b), expected);
    }

    fn check(content: &[u8]) -> Outcome {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("creature_test.txt");
        fs::write(&path, content).unwrap();
        check_file(&path).unwrap()
    }

    #[test_case(b"creature_test\r\n\r\n[OBJECT:CREATURE]\r\n\r\n[CREATURE:DOG]\r\n\t[NAME:dog:dogs:dog]\r\n"; "crlf file")]
    #[test_case(b"creature_test\n[OBJECT:CREATURE]\n[CREATURE:DOG]\n\t[NAME:dog:dogs:dog]\n"; "lf file")]
    #[test_case(b"creature_test\n[OBJECT:CREATURE]\nsome prose: no tokens here\n[CREATURE:DOG]"; "comments and no final newline")]
    #[test_case(b"creature_test\r\n[OBJECT:CREATURE]\r\n"; "declaration only")]
    #[test_case(b"creature_test\n[OBJECT:CREATURE]\n[NAME:stray]\n[CREATURE:DOG]\n[CREATURE:DOG]\n"; "invalid records")]
    #[test_case(b"spell_test\n[OBJECT:SPELL]\n[SPELL:FIREBALL]\n"; "unrecognized type")]
    fn file_round_trips(content: &[u8]) {
        assert!(matches!(check(content), Outcome::Ok));
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(check_file(&tmp.path().join("creature_gone.txt")).is_err());
    }
}
