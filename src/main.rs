use ansi_term::Style;
use bastok::mach::{proofreader_lookup, ProofInput};
use bastok::opt::Pass;
use bastok::settings::{Settings, Trace};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bastok",
    version,
    about = "A tokenizing compiler for 8-bit home computer BASIC",
    long_about = "Compiles annotated BASIC source into the interpreter's exact in-memory \
tokenized form. With -O the full optimization chain runs; --pass picks \
an explicit chain instead (repeatable, applied in the order given)."
)]
struct Cli {
    /// BASIC source file.
    input: PathBuf,
    #[arg(
        short = 'o',
        long = "outfile",
        value_name = "FILE",
        long_help = "Output file. Defaults to the input with a .tok extension."
    )]
    outfile: Option<PathBuf>,
    #[arg(
        short = 'a',
        long = "address",
        value_name = "ADDR",
        long_help = "Load address of the first line, decimal or 0x-prefixed hex. Defaults to 0x0801."
    )]
    address: Option<String>,
    #[arg(
        long = "max-line-length",
        value_name = "BYTES",
        long_help = "Ceiling on a merged line's emitted length. Defaults to 255."
    )]
    max_line_length: Option<usize>,
    #[arg(long = "preserve-numbers", action = clap::ArgAction::SetTrue)]
    preserve_numbers: bool,
    #[arg(
        short = 'O',
        long = "optimize",
        action = clap::ArgAction::SetTrue,
        long_help = "Run the documented optimization chain: remove-empty-statements, \
remove-rem-statements, shorten-variable-names, extract-constant-values, \
merge-lines, renumber."
    )]
    optimize: bool,
    #[arg(
        long = "pass",
        value_name = "NAME",
        action = clap::ArgAction::Append,
        long_help = "Run one named pass (repeatable, applied in order). Overrides -O."
    )]
    passes: Vec<String>,
    #[arg(
        long = "proof",
        value_name = "NAME",
        long_help = "Print a proofreader's check codes for the emitted image (line-codes)."
    )]
    proof: Option<String>,
    #[arg(long = "debug", action = clap::ArgAction::SetTrue)]
    debug: bool,
}

fn main() {
    if let Err(message) = run(Cli::parse()) {
        eprintln!("{}", Style::new().bold().paint(message));
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let source = std::fs::read_to_string(&cli.input)
        .map_err(|e| format!("CANNOT READ {}: {}", cli.input.display(), e))?;

    let mut settings = Settings::default();
    settings.source_file = cli.input.clone();
    if let Some(address) = &cli.address {
        settings.start_address = parse_address(address)?;
    }
    if let Some(max) = cli.max_line_length {
        settings.max_line_length = max;
    }
    settings.preserve_numbers = cli.preserve_numbers;
    if cli.debug {
        settings.trace = Trace::to(std::io::stderr());
    }

    let passes = if cli.passes.is_empty() {
        if cli.optimize {
            Pass::DEFAULT_CHAIN.to_vec()
        } else {
            vec![]
        }
    } else {
        cli.passes
            .iter()
            .map(|name| Pass::from_name(name).ok_or_else(|| format!("UNKNOWN PASS {}", name)))
            .collect::<Result<Vec<Pass>, String>>()?
    };

    let image = bastok::compile(&source, &settings, &passes).map_err(|e| e.to_string())?;

    let outfile = cli
        .outfile
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("tok"));
    std::fs::write(&outfile, &image.bytes)
        .map_err(|e| format!("CANNOT WRITE {}: {}", outfile.display(), e))?;

    if let Some(name) = &cli.proof {
        let proofreader =
            proofreader_lookup(name).ok_or_else(|| format!("UNKNOWN PROOFREADER {}", name))?;
        let stdout = std::io::stdout();
        proofreader
            .report(&ProofInput::Image(&image.bytes), &mut stdout.lock())
            .map_err(|e| e.to_string())?;
    }
    Ok(())
}

fn parse_address(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|_| format!("BAD ADDRESS {}", s))
}
