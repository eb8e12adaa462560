use anyhow::{Context, Result, bail};
use mobiledoc_config::{Config, ImportConfig};
use mobiledoc_engine::dom::DomTree;
use mobiledoc_engine::{
    Builder, DomParserOptions, EditorDomRenderer, MobiledocParser, Post, RenderTree,
    parse_html_with_options, parse_post_from_paste, render_mobiledoc,
};
use std::io::{Read, Write};
use std::{env, fs, io, process};

const USAGE: &str = "\
Usage: mobiledoc <command> [--pretty] [FILE]

Commands:
  import     Convert HTML into a mobiledoc document
  paste      Like import, but prefer a mobiledoc embedded in pasted HTML
  export     Render a mobiledoc document as editor HTML
  roundtrip  Parse a mobiledoc document and serialize it again

FILE defaults to standard input.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Import,
    Paste,
    Export,
    Roundtrip,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "import" => Some(Self::Import),
            "paste" => Some(Self::Paste),
            "export" => Some(Self::Export),
            "roundtrip" => Some(Self::Roundtrip),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    command: Command,
    pretty: bool,
    input: Option<String>,
}

fn parse_args(args: &[String]) -> Option<Args> {
    let mut rest = args.iter();
    let command = Command::from_arg(rest.next()?)?;
    let mut pretty = false;
    let mut input = None;

    for arg in rest {
        match arg.as_str() {
            "--pretty" => pretty = true,
            "-" => input = None,
            _ if arg.starts_with("--") => return None,
            _ if input.is_none() => input = Some(arg.clone()),
            _ => return None,
        }
    }

    Some(Args {
        command,
        pretty,
        input,
    })
}

fn import_options(config: &ImportConfig) -> DomParserOptions {
    DomParserOptions {
        unwrap_container: config.unwrap_container,
        merge_explicit_sections: config.merge_explicit_sections,
        collapse_whitespace: config.collapse_whitespace,
    }
}

fn read_input(input: Option<&str>) -> Result<String> {
    match input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read input file {path}"))
        }
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read standard input")?;
            Ok(content)
        }
    }
}

fn serialize(post: &Post, pretty: bool) -> Result<String> {
    let doc = render_mobiledoc(post).context("Post failed to render")?;
    Ok(doc.to_json(pretty)?)
}

fn export_html(post: &mut Post) -> Result<String> {
    let mut tree = DomTree::new("div");
    let mut render_tree = RenderTree::new(tree.root());
    EditorDomRenderer::new()
        .render(post, &mut render_tree, &mut tree)
        .context("Post failed to render to HTML")?;
    Ok(tree.inner_html(tree.root()))
}

fn run(args: &Args, config: &Config) -> Result<String> {
    let source = read_input(args.input.as_deref())?;
    let pretty = args.pretty || config.export.pretty;
    let options = import_options(&config.import);
    let mut builder = Builder::new();

    match args.command {
        Command::Import => {
            let post = parse_html_with_options(&source, &mut builder, options)
                .context("Failed to import HTML")?;
            log::info!("Imported {} section(s)", post.sections().len());
            serialize(&post, pretty)
        }
        Command::Paste => {
            let post = parse_post_from_paste(&source, &mut builder, options)
                .context("Failed to parse pasted content")?;
            serialize(&post, pretty)
        }
        Command::Export => {
            let mut post = MobiledocParser::new(&mut builder)
                .parse_json(&source)
                .context("Failed to parse mobiledoc")?;
            export_html(&mut post)
        }
        Command::Roundtrip => {
            let post = MobiledocParser::new(&mut builder)
                .parse_json(&source)
                .context("Failed to parse mobiledoc")?;
            let output = serialize(&post, pretty)?;
            if !pretty && output != source.trim() {
                log::warn!("Document changed on round-trip");
            }
            Ok(output)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(args) = parse_args(&args) else {
        eprintln!("{USAGE}");
        process::exit(1);
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => {
            log::debug!("Loaded config from {}", config_path.display());
            config
        }
        Ok(None) => Config::default(),
        Err(e) => bail!("Failed to load config file: {e}"),
    };

    let output = run(&args, &config)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}
