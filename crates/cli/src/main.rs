use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yanbao_core::notify::pushplus::PushPlusNotifier;
use yanbao_core::pipeline::{Pipeline, RunConfig};
use yanbao_core::select::SelectionCriteria;
use yanbao_core::time::cn_market::{china_today, DateRange};

#[derive(Debug, Parser)]
#[command(name = "yanbao", about = "Pick A-share stocks from analyst research reports")]
struct Args {
    /// First publish date (YYYY-MM-DD). Defaults to yesterday, China time.
    #[arg(long)]
    begin: Option<String>,

    /// Last publish date (YYYY-MM-DD). Defaults to today, China time.
    #[arg(long)]
    end: Option<String>,

    /// Keep every rating instead of only "买入".
    #[arg(long)]
    all_ratings: bool,

    /// Keep fetch order instead of ranking by trailing-month report count.
    #[arg(long)]
    no_rank: bool,

    /// Number of stocks to buy.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    count: u64,

    /// Amount to spend on each stock.
    #[arg(long, default_value_t = 100_000.0)]
    budget: f64,

    /// Send the result table to PushPlus (needs PUSHPLUS_TOKEN).
    #[arg(long)]
    push: bool,

    /// Also print every fetched report.
    #[arg(long)]
    show_all_reports: bool,

    /// Print the plan as JSON instead of a markdown table.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = yanbao_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let cfg = run_config(&args)?;

    let pipeline = Pipeline::from_settings(&settings)?;
    let output = match pipeline.run(&cfg).await {
        Ok(output) => output,
        Err(err) => {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(range = %cfg.range, error = %err, "run failed");
            return Err(err);
        }
    };

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output.plan).context("serialize plan failed")?
        );
    } else {
        println!("{}", output.markdown());
    }

    if args.show_all_reports {
        println!(
            "{}",
            yanbao_core::render::render_reports_markdown(output.all_reports())
        );
    }

    if args.push {
        let notifier = PushPlusNotifier::from_settings(&settings)?;
        let today = china_today(chrono::Utc::now());
        if let Err(err) = pipeline.push(&notifier, &output, today).await {
            let err = anyhow::Error::new(err);
            sentry_anyhow::capture_anyhow(&err);
            return Err(err);
        }
        tracing::info!(%today, rows = output.plan.rows.len(), "pushed result");
    }

    Ok(())
}

fn run_config(args: &Args) -> anyhow::Result<RunConfig> {
    let now = chrono::Utc::now();
    let begin = args
        .begin
        .clone()
        .unwrap_or_else(|| DateRange::default_for(now).begin_str());
    let range = DateRange::parse(&begin, args.end.as_deref(), now)?;

    let defaults = SelectionCriteria::default();
    Ok(RunConfig {
        range,
        criteria: SelectionCriteria {
            rating: if args.all_ratings { None } else { defaults.rating },
            rank_by_report_count: !args.no_rank,
            limit: usize::try_from(args.count).context("count does not fit in usize")?,
        },
        budget_per_stock: args.budget,
    })
}

fn init_sentry(settings: &yanbao_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
