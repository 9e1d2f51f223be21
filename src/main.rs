use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use hackc::{Binary, Features, RunOutcome, RunState, Session};

/// hackc is a VM translator and assembler toolchain for the Hack computer.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Translator extras, comma separated: bootstrap, annotate, halt
    #[arg(
        long,
        global = true,
        env = "HACKC_FEATURES",
        default_value = "bootstrap,annotate,halt"
    )]
    features: Features,
}

#[derive(Subcommand)]
enum Command {
    /// Translate `.vm` files (or directories of them) into a single `.asm` file
    Translate {
        /// `.vm` files or directories to translate
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Destination to output .asm file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the result to stdout instead of a file
        #[arg(short, long)]
        print: bool,
    },
    /// Assemble a `.asm` file into a `.hack` file
    Assemble {
        /// `.asm` file to assemble
        name: PathBuf,
        /// Destination to output .hack file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the result to stdout instead of a file
        #[arg(short, long)]
        print: bool,
    },
    /// Translate and assemble `.vm` files straight into a `.hack` file
    Build {
        /// `.vm` files or directories to build
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Destination to output .hack file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Write the result to stdout instead of a file
        #[arg(short, long)]
        print: bool,
    },
    /// Check a `.vm` or `.asm` file without outputting anything
    Check {
        /// File to check
        name: PathBuf,
    },
    /// Run a `.vm`, `.asm` or `.hack` file and report the final stack
    Run {
        /// File to run
        name: PathBuf,
        /// Maximum amount of instructions to execute
        #[arg(short, long, default_value_t = 1_000_000)]
        cycles: u64,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(hackc::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    let features = args.features;
    match args.command {
        Command::Translate {
            paths,
            output,
            print,
        } => {
            let units = read_units(&paths)?;
            message(Green, "Translating", &format!("{} unit(s)", units.len()));
            let asm = Session::new(features).translate(&borrow_units(&units))?;
            let dest = output.unwrap_or_else(|| default_output(&paths, "asm"));
            emit(&asm, &dest, print)
        }
        Command::Assemble {
            name,
            output,
            print,
        } => {
            file_message(Green, "Assembling", &name);
            let src = fs::read_to_string(&name).into_diagnostic()?;
            let binary = Session::new(features).assemble(&src)?;
            let dest = output.unwrap_or_else(|| name.with_extension("hack"));
            emit(&binary.to_text(), &dest, print)
        }
        Command::Build {
            paths,
            output,
            print,
        } => {
            let units = read_units(&paths)?;
            message(Green, "Building", &format!("{} unit(s)", units.len()));
            let binary = Session::new(features).build(&borrow_units(&units))?;
            let dest = output.unwrap_or_else(|| default_output(&paths, "hack"));
            emit(&binary.to_text(), &dest, print)
        }
        Command::Check { name } => {
            file_message(Green, "Checking", &name);
            let src = fs::read_to_string(&name).into_diagnostic()?;
            match extension(&name)? {
                "vm" => {
                    let unit = unit_name(&name);
                    Session::new(features).build(&[(unit.as_str(), src.as_str())])?;
                }
                "asm" => {
                    Session::new(features).assemble(&src)?;
                }
                _ => bail!("Can only check .vm or .asm files. Exiting..."),
            }
            message(Green, "Success", "no errors found!");
            Ok(())
        }
        Command::Run { name, cycles } => run(&name, features, cycles),
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

// Status goes to stderr so `--print` output stays clean
fn message(color: MsgColor, left: &str, right: &str) {
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    eprintln!("{left:>12} {right}");
}

fn emit(contents: &str, dest: &Path, print: bool) -> Result<()> {
    if print {
        print!("{contents}");
        return Ok(());
    }
    fs::write(dest, contents).into_diagnostic()?;
    file_message(MsgColor::Green, "Saved", dest);
    Ok(())
}

fn extension(path: &Path) -> Result<&str> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => Ok(ext),
        None => bail!("File has no extension. Exiting..."),
    }
}

fn unit_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Main".to_string())
}

/// Read every `.vm` unit named by `paths`, expanding directories in file name order.
fn read_units(paths: &[PathBuf]) -> Result<Vec<(String, String)>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let pattern = path.join("*.vm");
            let Some(pattern) = pattern.to_str() else {
                bail!("Path {} is not valid UTF-8", path.display());
            };
            let mut found: Vec<PathBuf> = glob::glob(pattern)
                .into_diagnostic()?
                .collect::<Result<_, _>>()
                .into_diagnostic()?;
            if found.is_empty() {
                bail!("No .vm files found in {}", path.display());
            }
            found.sort();
            files.extend(found);
        } else {
            files.push(path.clone());
        }
    }

    let mut units = Vec::with_capacity(files.len());
    for file in files {
        file_message(MsgColor::Cyan, "Reading", &file);
        let src = fs::read_to_string(&file).into_diagnostic()?;
        units.push((unit_name(&file), src));
    }
    Ok(units)
}

fn borrow_units(units: &[(String, String)]) -> Vec<(&str, &str)> {
    units
        .iter()
        .map(|(name, src)| (name.as_str(), src.as_str()))
        .collect()
}

/// `prog.vm` becomes `prog.<ext>`, a directory `dir` becomes `dir/dir.<ext>`.
fn default_output(paths: &[PathBuf], ext: &str) -> PathBuf {
    let first = &paths[0];
    if first.is_dir() {
        let name = first
            .canonicalize()
            .ok()
            .and_then(|dir| dir.file_name().map(|n| n.to_owned()))
            .unwrap_or_else(|| "out".into());
        first.join(name).with_extension(ext)
    } else {
        first.with_extension(ext)
    }
}

fn run(name: &Path, features: Features, cycles: u64) -> Result<()> {
    file_message(MsgColor::Green, "Assembling", name);
    let src = fs::read_to_string(name).into_diagnostic()?;
    let mut program = match extension(name)? {
        "vm" => {
            let unit = unit_name(name);
            let binary: Binary = Session::new(features).build(&[(unit.as_str(), src.as_str())])?;
            RunState::from_raw(binary.words())?
        }
        "asm" => RunState::from_raw(Session::new(features).assemble(&src)?.words())?,
        "hack" => RunState::from_hack_text(&src)?,
        _ => bail!("File has unknown extension. Exiting..."),
    };

    message(MsgColor::Green, "Running", "emitted binary");
    let outcome = program.run(cycles);
    match outcome {
        RunOutcome::Halted => message(MsgColor::Cyan, "Stopped", "halted"),
        RunOutcome::Finished => message(MsgColor::Cyan, "Stopped", "finished"),
        RunOutcome::Exhausted => message(MsgColor::Red, "Failed", "cycle limit reached"),
    }

    println!("cycles: {}", program.cycles());
    println!("SP: {}", program.sp());
    match program.stack_top() {
        Some(top) => println!("top: {}", top as i16),
        None => println!("top: empty"),
    }

    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}
