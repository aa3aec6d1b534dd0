//! CLI driver: binds the `-f -l -o -I -n` flag surface to the library's
//! `Compiler` builder.

use std::path::PathBuf;
use std::process::ExitCode;

use exchangec::compiler::{Compiler, Language};
use lexopt::prelude::*;

const USAGE: &str = "\
Usage: exchangec -f <protocol_file> -l {cpp|php|csharp} [-o <output_dir>] [-I <search_path>]... [-n {unix|dos}]

Options:
  -f <FILE>       Protocol file to compile (required)
  -l <LANG>       Target language: cpp, php, or csharp (required)
  -o <DIR>        Output directory (default: .)
  -I <DIR>        Additional import search directory (repeatable)
  -n <STYLE>      Line ending: unix or dos (default: unix)
  -h, --help      Print this help and exit";

struct Args {
    file: Option<PathBuf>,
    lang: Option<String>,
    out_dir: PathBuf,
    import_dirs: Vec<PathBuf>,
    newline: String,
}

impl Default for Args {
    fn default() -> Self {
        Args { file: None, lang: None, out_dir: PathBuf::from("."), import_dirs: Vec::new(), newline: "unix".to_string() }
    }
}

/// A command-line usage violation: reported with the banner, distinct from a
/// compile-time diagnostic (which is printed on its own, already formatted).
struct UsageError(String);

fn parse_args() -> Result<Args, lexopt::Error> {
    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_env();
    while let Some(arg) = parser.next()? {
        match arg {
            Short('f') => args.file = Some(PathBuf::from(parser.value()?)),
            Short('l') => args.lang = Some(parser.value()?.string()?),
            Short('o') => args.out_dir = PathBuf::from(parser.value()?),
            Short('I') => args.import_dirs.push(PathBuf::from(parser.value()?)),
            Short('n') => args.newline = parser.value()?.string()?,
            Short('h') | Long("help") => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            other => return Err(other.unexpected()),
        }
    }
    Ok(args)
}

fn validate(args: Args) -> Result<Compiler, UsageError> {
    let file = args.file.ok_or_else(|| UsageError("missing required `-f <protocol_file>`".to_string()))?;
    if !file.is_file() {
        return Err(UsageError(format!("can not find protocol file `{}`", file.display())));
    }

    let lang_str = args.lang.ok_or_else(|| UsageError("missing required `-l {cpp|php|csharp}`".to_string()))?;
    let language = Language::parse(&lang_str).ok_or_else(|| UsageError(format!("unrecognized language `{lang_str}`")))?;

    if !args.out_dir.is_dir() {
        return Err(UsageError(format!("output directory `{}` does not exist", args.out_dir.display())));
    }

    let mut compiler = Compiler::new(&file);
    compiler.output_dir(&args.out_dir).language(language);
    for dir in &args.import_dirs {
        compiler.import_dir(dir);
    }
    match args.newline.as_str() {
        "dos" => compiler.newline_dos(),
        _ => compiler.newline_unix(),
    };
    Ok(compiler)
}

fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let compiler = match validate(args) {
        Ok(compiler) => compiler,
        Err(UsageError(message)) => {
            eprintln!("error: {message}");
            eprintln!("{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    match compiler.run() {
        Ok(sink) => {
            for warning in sink.warnings() {
                eprintln!("{warning}");
            }
            ExitCode::SUCCESS
        }
        Err(compile_error) => {
            eprintln!("{}", compile_error.to_diagnostic());
            ExitCode::FAILURE
        }
    }
}
