//! CLI wrapper around [`tdl_schema::convert`] (§4.8, §6).
//!
//! Usage: `tdl2schema [PATH]`. With no argument, `-`, or `/dev/stdin`, reads
//! the TDL document from standard input; otherwise treats the argument as a
//! filesystem path. On success, prints the OpenAI schema as pretty JSON, a
//! `---` separator line, then the Gemini schema as pretty JSON, and exits 0.
//! On failure, prints `Error: <message>` to stderr and exits 1.

use std::io::Read;
use std::process::ExitCode;
use tdl_schema::TdlError;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), TdlError> {
    let input = read_input(args.first().map(String::as_str))?;
    let converted = tdl_schema::convert(&input)?;

    let openai_text = serde_json::to_string_pretty(&converted.openai)
        .expect("a converted schema is always valid JSON");
    let gemini_text = serde_json::to_string_pretty(&converted.gemini)
        .expect("a converted schema is always valid JSON");

    println!("{openai_text}");
    println!("---");
    println!("{gemini_text}");
    Ok(())
}

fn read_input(arg: Option<&str>) -> Result<String, TdlError> {
    match arg {
        None | Some("-") | Some("/dev/stdin") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => std::fs::read_to_string(path).map_err(TdlError::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_argument_errors_mention_the_path() {
        let err = read_input(Some("/no/such/path.tdl.yaml")).unwrap_err();
        assert!(err.to_string().contains("io error"));
    }
}
