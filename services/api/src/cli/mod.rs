//! bookshelf-api CLI 分发：`run`、`check-config`、`hash-password`、`version`。

use anyhow::anyhow;

use crate::{
    auth::password::{CredentialHasher, DEFAULT_BCRYPT_COST},
    config::Config,
};

/// CLI 分发结果。
pub(crate) enum CliDispatch {
    /// 继续启动 HTTP 服务。
    Run,
    /// 命令已处理完成，主程序应退出。
    Exit,
}

/// 已解析的命令。
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run,
    Help,
    Version,
    CheckConfig(OutputFormat),
    HashPassword { plaintext: String, cost: u32 },
}

/// `check-config` 输出格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

/// 解析并执行 CLI。
pub(crate) fn dispatch(args: &[String]) -> anyhow::Result<CliDispatch> {
    match parse(args)? {
        Command::Run => Ok(CliDispatch::Run),
        Command::Help => {
            print_root_help();
            Ok(CliDispatch::Exit)
        }
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(CliDispatch::Exit)
        }
        Command::CheckConfig(format) => {
            run_check_config(format)?;
            Ok(CliDispatch::Exit)
        }
        Command::HashPassword { plaintext, cost } => {
            let hash = CredentialHasher::new(cost)?.hash(&plaintext)?;
            println!("{hash}");
            Ok(CliDispatch::Exit)
        }
    }
}

fn parse(args: &[String]) -> anyhow::Result<Command> {
    let Some(first) = args.first() else {
        return Ok(Command::Run);
    };
    let cmd = first.trim();
    if cmd.is_empty() || cmd == "run" {
        return Ok(Command::Run);
    }
    if matches!(cmd, "-h" | "--help" | "help") {
        return Ok(Command::Help);
    }

    match cmd {
        "version" | "--version" | "-V" => Ok(Command::Version),
        "check-config" => parse_format(&args[1..]).map(Command::CheckConfig),
        "hash-password" => parse_hash_password(&args[1..]),
        other => Err(anyhow!(
            "unknown command: {other}; run `bookshelf-api --help` for usage"
        )),
    }
}

/// 解析 check-config 的 `--format` 参数。
fn parse_format(args: &[String]) -> anyhow::Result<OutputFormat> {
    if args.is_empty() {
        return Ok(OutputFormat::Text);
    }
    if args.len() == 2 && args[0] == "--format" {
        return match args[1].as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(anyhow!("unsupported check-config format: {other}")),
        };
    }
    Err(anyhow!("usage: bookshelf-api check-config [--format text|json]"))
}

/// `hash-password <plaintext> [--cost N]`。
fn parse_hash_password(args: &[String]) -> anyhow::Result<Command> {
    let usage = || anyhow!("usage: bookshelf-api hash-password <plaintext> [--cost N]");
    let (plaintext, rest) = args.split_first().ok_or_else(usage)?;
    if plaintext.is_empty() {
        return Err(usage());
    }
    let cost = match rest {
        [] => DEFAULT_BCRYPT_COST,
        [flag, value] if flag == "--cost" => value
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow!("invalid --cost value: {value}"))?,
        _ => return Err(usage()),
    };
    Ok(Command::HashPassword {
        plaintext: plaintext.clone(),
        cost,
    })
}

/// 加载并校验配置，输出脱敏摘要；配置无效时返回错误（非零退出码）。
fn run_check_config(format: OutputFormat) -> anyhow::Result<()> {
    let config = Config::load()?;
    let summary = config.summary();
    match format {
        OutputFormat::Text => {
            if let Some(fields) = summary.as_object() {
                for (key, value) in fields {
                    match value {
                        serde_json::Value::String(text) => println!("{key}: {text}"),
                        serde_json::Value::Null => println!("{key}: -"),
                        other => println!("{key}: {other}"),
                    }
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

/// 打印 root help。
fn print_root_help() {
    println!("bookshelf-api usage:");
    println!("  bookshelf-api run");
    println!("  bookshelf-api check-config [--format text|json]");
    println!("  bookshelf-api hash-password <plaintext> [--cost N]");
    println!("  bookshelf-api version");
}
