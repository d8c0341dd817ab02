use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use sql_helper::prelude::*;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run SQL scripts and statements through sql-helper")]
struct Args {
    /// Properties file with jdbc.driver / jdbc.url / ... keys
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, value_enum)]
    driver: Option<Driver>,
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long, value_enum)]
    strategy: Option<ConnectionStrategy>,
    /// Repeat for more log output
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a SQL script, one statement per line
    Script { file: PathBuf },
    /// Run a query and print one JSON object per row
    Query {
        sql: String,
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
    /// Run a statement and print the affected row count
    Exec {
        sql: String,
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
    },
}

fn parse_param(raw: &str) -> RowValues {
    if raw.eq_ignore_ascii_case("null") {
        return RowValues::Null;
    }
    if let Ok(b) = raw.parse::<bool>() {
        return RowValues::Bool(b);
    }
    if let Ok(i) = raw.parse::<i64>() {
        return RowValues::Int(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return RowValues::Float(f);
    }
    RowValues::Text(raw.to_string())
}

fn resolve_options(args: &Args) -> Result<DatabaseOptions, SqlHelperError> {
    let mut opts = match (&args.config, &args.url) {
        (Some(path), _) => DatabaseOptions::from_properties_file(path)?,
        (None, Some(url)) => {
            DatabaseOptions::new(args.driver.unwrap_or(Driver::Sqlite), url.clone())
        }
        (None, None) => {
            return Err(SqlHelperError::ConfigError(
                "either --config or --url is required".into(),
            ));
        }
    };
    if let Some(driver) = args.driver {
        opts.driver = driver;
    }
    if let Some(url) = &args.url {
        opts.url.clone_from(url);
    }
    if let Some(username) = &args.username {
        opts.username = Some(username.clone());
    }
    if let Some(password) = &args.password {
        opts.password = Some(password.clone());
    }
    if let Some(strategy) = args.strategy {
        opts.strategy = strategy;
    }
    Ok(opts)
}

async fn run(args: Args) -> Result<(), SqlHelperError> {
    let db = Database::connect(resolve_options(&args)?).await?;
    let mut ctx = db.begin_context();

    let outcome = match &args.command {
        Command::Script { file } => ctx.execute_sql_file(file).await.map(|executed| {
            println!("{executed}");
        }),
        Command::Query { sql, params } => {
            let params: Vec<RowValues> = params.iter().map(|p| parse_param(p)).collect();
            ctx.execute_query(sql, &params).await.map(|rows| {
                for row in rows {
                    println!("{}", serde_json::to_string(&row).unwrap_or_default());
                }
            })
        }
        Command::Exec { sql, params } => {
            let params: Vec<RowValues> = params.iter().map(|p| parse_param(p)).collect();
            ctx.execute_update(sql, &params).await.map(|affected| {
                println!("{affected}");
            })
        }
    };

    ctx.close_connection().await;
    outcome
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("sql-helper").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn params_parse_most_specific_first() {
        assert_eq!(parse_param("NULL"), RowValues::Null);
        assert_eq!(parse_param("true"), RowValues::Bool(true));
        assert_eq!(parse_param("42"), RowValues::Int(42));
        assert_eq!(parse_param("-1.5"), RowValues::Float(-1.5));
        assert_eq!(parse_param("Acme"), RowValues::Text("Acme".into()));
    }

    #[test]
    fn url_flag_builds_options() {
        let argv = ["--url", "app.db", "--strategy", "direct", "exec", "SELECT 1"];
        let opts = resolve_options(&args(&argv)).unwrap();
        assert_eq!(opts.driver, Driver::Sqlite);
        assert_eq!(opts.url, "app.db");
        assert_eq!(opts.strategy, ConnectionStrategy::Direct);
    }

    #[test]
    fn flags_override_the_properties_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "jdbc.driver=org.sqlite.JDBC\njdbc.url=jdbc:sqlite:from-file.db\njdbc.username=alice"
        )
        .unwrap();
        let config = file.path().to_string_lossy().into_owned();

        let from_file =
            resolve_options(&args(&["--config", config.as_str(), "script", "x.sql"])).unwrap();
        assert_eq!(from_file.url, "jdbc:sqlite:from-file.db");
        assert_eq!(from_file.username.as_deref(), Some("alice"));

        let overridden = resolve_options(&args(&[
            "--config", config.as_str(), "--url", "other.db", "--username", "bob", "script", "x.sql",
        ]))
        .unwrap();
        assert_eq!(overridden.url, "other.db");
        assert_eq!(overridden.username.as_deref(), Some("bob"));
    }

    #[test]
    fn missing_config_and_url_is_a_config_error() {
        let err = resolve_options(&args(&["exec", "SELECT 1"])).unwrap_err();
        assert!(matches!(err, SqlHelperError::ConfigError(_)));
    }
}
