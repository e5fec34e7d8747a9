mod commands;
mod context;
mod examples;
mod output;
mod theme;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Color as ClapColor, RgbColor, Style},
    },
    error::ErrorKind,
};

use colored::{Color as ThemeColor, Colorize, control::ShouldColorize};
use std::fmt::Write;
use std::io::{self, Write as IoWrite};

use commands::{
    counters::{CounterCommands, handle_counter_commands},
    init::{InitArgs, handle_init},
    schema::{SchemaCommands, handle_schema_commands},
};
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("AGORA_REDIS_URL", "Redis connection URL; overrides store.url in agora.toml"),
    ("RUST_LOG", "Log filter for library diagnostics (e.g. agora=debug)"),
];

#[derive(Parser)]
#[command(name = "agora")]
#[command(version)]
#[command(
    about = "Operator tool for the agora social-network store",
    long_about = r#"Operator CLI for the agora store that provides:

• A browsable view of the social schema and its relations
• The relational contract rendered as SQL DDL
• Counter-cache drift detection and repair against a live store

Commands:
  init      Write agora.toml in the current directory
  schema    Inspect tables, relations and DDL
  counters  Check and reconcile counter caches
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_with_styles() -> Self {
        let command = build_cli_command();
        match command.styles(help_styles()).try_get_matches() {
            Ok(matches) => Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit()),
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    print_framed(io::stdout(), || err.print());
                    std::process::exit(0);
                }
                ErrorKind::MissingSubcommand => {
                    let mut command = build_cli_command().styles(help_styles());
                    print_framed(io::stderr(), || {
                        eprintln!("error: 'agora' requires a subcommand but one was not provided\n");
                        command.write_long_help(&mut io::stderr())
                    });
                    std::process::exit(err.exit_code());
                }
                _ => {
                    print_framed(io::stderr(), || err.print());
                    std::process::exit(err.exit_code());
                }
            },
        }
    }
}

/// Surrounds `print` with blank lines on `stream`. Broken pipes are ignored.
fn print_framed<W, F>(mut stream: W, print: F)
where
    W: IoWrite,
    F: FnOnce() -> io::Result<()>,
{
    let _ = blank_line(&mut stream);
    if let Err(print_err) = print()
        && print_err.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("Failed to display help: {print_err}");
    }
    let _ = blank_line(&mut stream);
}

fn blank_line<W: IoWrite>(stream: &mut W) -> io::Result<()> {
    stream.write_all(b"\n")?;
    stream.flush()
}

fn build_cli_command() -> Command {
    let use_color = detect_color_support();
    let mut command = Cli::command()
        .after_long_help(render_top_level_appendix(use_color))
        .color(if use_color { ColorChoice::Auto } else { ColorChoice::Never });
    for example in command_examples() {
        if command.find_subcommand(example.name).is_some() {
            let help_text = render_examples(example.groups, use_color);
            command = command.mut_subcommand(example.name, |sub| sub.after_long_help(help_text));
        }
    }
    command
}

fn render_examples(groups: &[ExampleGroup], use_color: bool) -> String {
    let mut buffer = format!("{}\n", stylize("Examples:", THEME.highlight, true, use_color));
    let arrow = stylize(ICONS.arrow, THEME.secondary, false, use_color);
    let blocks: Vec<String> = groups
        .iter()
        .map(|group| {
            let mut block = format!("  {}\n", stylize(group.title, THEME.primary, true, use_color));
            for line in group.commands {
                let _ = writeln!(block, "    {arrow} {}", stylize(line, THEME.secondary, false, use_color));
            }
            block
        })
        .collect();
    buffer.push_str(&blocks.join("\n"));
    buffer
}

fn render_top_level_appendix(use_color: bool) -> String {
    let mut buffer = format!("{}\n", stylize("Environment Variables:", THEME.highlight, true, use_color));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(
            buffer,
            "  {}  {}",
            stylize(key, THEME.key, true, use_color),
            stylize(description, THEME.value, false, use_color)
        );
    }
    let _ = writeln!(
        buffer,
        "\n{} {}",
        stylize("Tip:", THEME.highlight, true, use_color),
        stylize(
            "Run 'agora <command> --help' for per-command examples.",
            THEME.secondary,
            false,
            use_color
        )
    );
    buffer
}

fn stylize(text: &str, color: ThemeColor, bold: bool, use_color: bool) -> String {
    match (use_color, bold) {
        (false, _) => text.to_string(),
        (true, true) => text.color(color).bold().to_string(),
        (true, false) => text.color(color).to_string(),
    }
}

fn detect_color_support() -> bool {
    ShouldColorize::from_env().should_colorize()
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(style_from_color(theme.primary).bold())
        .header(style_from_color(theme.highlight).bold())
        .literal(style_from_color(theme.secondary))
        .placeholder(style_from_color(theme.muted))
        .valid(style_from_color(theme.success))
        .invalid(style_from_color(theme.warning))
        .error(style_from_color(theme.error).bold())
}

fn style_from_color(color: ThemeColor) -> Style {
    Style::new().fg_color(Some(color_to_clap_color(color)))
}

fn color_to_clap_color(color: ThemeColor) -> ClapColor {
    let ansi = match color {
        ThemeColor::TrueColor { r, g, b } => return ClapColor::Rgb(RgbColor(r, g, b)),
        ThemeColor::Black => AnsiColor::Black,
        ThemeColor::Red => AnsiColor::Red,
        ThemeColor::Green => AnsiColor::Green,
        ThemeColor::Yellow => AnsiColor::Yellow,
        ThemeColor::Blue => AnsiColor::Blue,
        ThemeColor::Magenta => AnsiColor::Magenta,
        ThemeColor::Cyan => AnsiColor::Cyan,
        ThemeColor::White => AnsiColor::White,
        ThemeColor::BrightBlack => AnsiColor::BrightBlack,
        ThemeColor::BrightRed => AnsiColor::BrightRed,
        ThemeColor::BrightGreen => AnsiColor::BrightGreen,
        ThemeColor::BrightYellow => AnsiColor::BrightYellow,
        ThemeColor::BrightBlue => AnsiColor::BrightBlue,
        ThemeColor::BrightMagenta => AnsiColor::BrightMagenta,
        ThemeColor::BrightCyan => AnsiColor::BrightCyan,
        ThemeColor::BrightWhite => AnsiColor::BrightWhite,
    };
    ClapColor::Ansi(ansi)
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default agora.toml in the current directory
    Init(InitArgs),

    /// Inspect tables, relations and the SQL contract
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// Detect and repair counter-cache drift
    #[command(subcommand)]
    Counters(CounterCommands),
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let cli = Cli::parse_with_styles();
    let framed = !cli.quiet && cli.output != OutputFormat::Json;
    if framed {
        let _ = blank_line(&mut io::stdout());
    }

    if let Err(err) = execute(cli).await {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
    if framed {
        let _ = blank_line(&mut io::stdout());
    }
}

async fn execute(cli: Cli) -> Result<()> {
    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output,
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    match cli.command {
        Commands::Init(args) => handle_init(args, &output).await,
        Commands::Schema(command) => handle_schema_commands(command, &output).await,
        Commands::Counters(command) => handle_counter_commands(command, &output).await,
    }
}
