//! gfmark CLI: Markdown from a file or stdin to HTML on stdout.
//!
//! ```text
//! gfmark [--unsafe] [--smart] [--sourcepos] [--hardbreaks] [--footnotes]
//!        [-e EXTENSION]... [FILE | -]
//! ```

use std::io::{self, Read, Write};
use std::process::ExitCode;

use gfmark::{Options, ParserState};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("gfmark: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut options = Options::default();
    let mut extensions: Vec<String> = Vec::new();
    let mut path: Option<String> = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--unsafe" => options.unsafe_ = true,
            "--smart" => options.smart = true,
            "--sourcepos" => options.sourcepos = true,
            "--hardbreaks" => options.hardbreaks = true,
            "--nobreaks" => options.nobreaks = true,
            "--footnotes" => options.footnotes = true,
            "--validate-utf8" => options.validate_utf8 = true,
            "-e" | "--extension" => {
                let name = args.next().ok_or("missing extension name after -e")?;
                extensions.push(name);
            }
            "--gfm" => {
                extensions.extend(gfmark::core_registry().names().map(str::to_string));
            }
            "--version" => {
                println!("gfmark {}", gfmark::version());
                return Ok(());
            }
            "-" => path = None,
            other if other.starts_with('-') => return Err(format!("unknown option: {other}").into()),
            other => path = Some(other.to_string()),
        }
    }

    let input = match &path {
        Some(path) => std::fs::read(path).map_err(|source| gfmark::Error::Input { path: path.into(), source })?,
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            buf
        }
    };
    let text = if options.validate_utf8 {
        String::from_utf8_lossy(&input).into_owned()
    } else {
        String::from_utf8(input).map_err(|e| gfmark::Error::InvalidUtf8 { offset: e.utf8_error().valid_up_to() })?
    };

    let names: Vec<&str> = extensions.iter().map(String::as_str).collect();
    let html = ParserState::with_extensions(options, &names)?.markdown_to_html(&text)?;
    io::stdout().write_all(html.as_bytes())?;

    Ok(())
}
