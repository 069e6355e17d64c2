//! Reshaper CLI - inspect and serve year/country datasets
//!
//! # Main Commands
//!
//! ```bash
//! reshaper serve --dataset choropleth_map.csv --geojson custom.geo.json
//! reshaper reshape gdp.csv --schema gdp          # Year index as JSON
//! reshaper lookup choropleth_map.csv --country France --year 2010
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! reshaper parse input.csv                      # Raw rows as JSON
//! reshaper rank gdp.csv --schema gdp --year 2010
//! reshaper series gdp.csv --schema gdp --country Chad
//! reshaper legend gdp.csv --schema gdp --buckets 5
//! reshaper legend choropleth_map.csv --sequential --buckets 6
//! reshaper join choropleth_map.csv --geojson custom.geo.json --year 2010
//! ```

use clap::{Args, Parser, Subcommand};
use reshaper::config::{DEFAULT_GEO_NAME_PROPERTY, DEFAULT_LEGEND_BUCKETS, MAX_LEGEND_BUCKETS};
use reshaper::{
    fill_for_year, load_dataset, load_regions, parse_csv_file_auto, DatasetContext, Legend,
    LoadOptions, SchemaPreset, SequentialLegend, ServerConfig,
};
use std::fs;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "reshaper")]
#[command(about = "Reshape CSV datasets by year and country for choropleth and treemap views", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Which file to load and how to read its columns.
#[derive(Args)]
struct DatasetArgs {
    /// Input CSV file
    input: PathBuf,

    /// Column preset: choropleth (Country/Year/Total) or gdp (Entity/Year/GDP per capita)
    #[arg(short, long, default_value = "choropleth")]
    schema: String,

    /// Override the country column name
    #[arg(long)]
    country_column: Option<String>,

    /// Override the year column name
    #[arg(long)]
    year_column: Option<String>,

    /// Override the value column name
    #[arg(long)]
    value_column: Option<String>,

    /// Drop rows after this year (overrides the preset)
    #[arg(long)]
    max_year: Option<i32>,

    /// Keep every year, even when the preset has a cutoff
    #[arg(long, conflicts_with = "max_year")]
    all_years: bool,

    /// CSV delimiter (auto-detect if not specified)
    #[arg(short, long)]
    delimiter: Option<char>,
}

impl DatasetArgs {
    fn load_options(&self) -> Result<LoadOptions, reshaper::SchemaError> {
        let mut options = self.schema.parse::<SchemaPreset>()?.load_options();

        if let Some(ref c) = self.country_column {
            options.schema.country_column = c.clone();
        }
        if let Some(ref c) = self.year_column {
            options.schema.year_column = c.clone();
        }
        if let Some(ref c) = self.value_column {
            options.schema.value_column = c.clone();
        }
        if self.all_years {
            options.max_year = None;
        } else if self.max_year.is_some() {
            options.max_year = self.max_year;
        }
        options.delimiter = self.delimiter;

        Ok(options)
    }

    async fn load(&self) -> Result<DatasetContext, Box<dyn std::error::Error>> {
        let options = self.load_options()?;
        Ok(load_dataset(&self.input, &options).await?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV file and output raw rows as JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Group a dataset by year and output the index as JSON
    Reshape {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up one country's value for a year
    Lookup {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(long)]
        country: String,

        #[arg(long)]
        year: i32,
    },

    /// Entries of a year, largest first
    Rank {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(long)]
        year: i32,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// A country's available values over time
    Series {
        #[command(flatten)]
        dataset: DatasetArgs,

        #[arg(long)]
        country: String,
    },

    /// Threshold or sequential legend over the dataset's values
    Legend {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// Number of buckets (stops with --sequential)
        #[arg(long, default_value_t = DEFAULT_LEGEND_BUCKETS)]
        buckets: usize,

        /// Stops over [max, 0] as on the choropleth, instead of thresholds
        #[arg(long)]
        sequential: bool,
    },

    /// Join GeoJSON regions with a year's values
    Join {
        #[command(flatten)]
        dataset: DatasetArgs,

        /// GeoJSON FeatureCollection
        #[arg(long)]
        geojson: PathBuf,

        #[arg(long)]
        year: i32,

        /// Feature property holding the country name
        #[arg(long, default_value = DEFAULT_GEO_NAME_PROPERTY)]
        property: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: RESHAPER_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Dataset CSV (default: RESHAPER_DATASET)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Column preset (default: RESHAPER_SCHEMA or choropleth)
        #[arg(short, long)]
        schema: Option<String>,

        /// GeoJSON regions (default: RESHAPER_GEOJSON)
        #[arg(long)]
        geojson: Option<PathBuf>,

        /// Directory of pages and scripts (default: RESHAPER_STATIC_DIR)
        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Reshape { dataset, output } => cmd_reshape(&dataset, output.as_deref()).await,

        Commands::Lookup {
            dataset,
            country,
            year,
        } => cmd_lookup(&dataset, &country, year).await,

        Commands::Rank {
            dataset,
            year,
            output,
        } => cmd_rank(&dataset, year, output.as_deref()).await,

        Commands::Series { dataset, country } => cmd_series(&dataset, &country).await,

        Commands::Legend {
            dataset,
            buckets,
            sequential,
        } => cmd_legend(&dataset, buckets, sequential).await,

        Commands::Join {
            dataset,
            geojson,
            year,
            property,
            output,
        } => cmd_join(&dataset, &geojson, year, &property, output.as_deref()).await,

        Commands::Serve {
            port,
            dataset,
            schema,
            geojson,
            static_dir,
        } => cmd_serve(port, dataset, schema, geojson, static_dir).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_parse(input: &Path, delimiter: Option<char>, output: Option<&Path>) -> CliResult {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input, delimiter)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        reshaper::transform::format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.records.len());

    let fields: Vec<_> = result.records.iter().map(|r| &r.fields).collect();
    let json = serde_json::to_string_pretty(&fields)?;
    write_output(&json, output)
}

async fn cmd_reshape(args: &DatasetArgs, output: Option<&Path>) -> CliResult {
    let ctx = args.load().await?;

    eprintln!(
        "📦 {} values, years {}",
        ctx.index.len(),
        match (ctx.index.first_year(), ctx.index.last_year()) {
            (Some(first), Some(last)) => format!("{}-{}", first, last),
            _ => "none".to_string(),
        }
    );

    let json = serde_json::to_string_pretty(&ctx)?;
    write_output(&json, output)
}

async fn cmd_lookup(args: &DatasetArgs, country: &str, year: i32) -> CliResult {
    let ctx = args.load().await?;
    println!("{}", ctx.value_for(country, year));
    Ok(())
}

async fn cmd_rank(args: &DatasetArgs, year: i32, output: Option<&Path>) -> CliResult {
    let ctx = args.load().await?;
    let ranked = ctx.ranked(year);
    eprintln!("📊 {} entries in {}", ranked.len(), year);

    let json = serde_json::to_string_pretty(&ranked)?;
    write_output(&json, output)
}

async fn cmd_series(args: &DatasetArgs, country: &str) -> CliResult {
    let ctx = args.load().await?;
    let series = ctx.series(country);
    if series.is_empty() {
        eprintln!("⚠️  No available values for '{}'", country);
    }

    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

async fn cmd_legend(args: &DatasetArgs, buckets: usize, sequential: bool) -> CliResult {
    let min = if sequential { 2 } else { 1 };
    if !(min..=MAX_LEGEND_BUCKETS).contains(&buckets) {
        return Err(format!("--buckets must be between {} and {}", min, MAX_LEGEND_BUCKETS).into());
    }

    let ctx = args.load().await?;
    let extent = ctx.extent.ok_or("dataset has no values")?;

    let (labels, json) = if sequential {
        let legend = SequentialLegend::new(extent, buckets);
        (legend.labels.clone(), serde_json::to_string_pretty(&legend)?)
    } else {
        let legend = Legend::new(extent, buckets);
        (legend.labels.clone(), serde_json::to_string_pretty(&legend)?)
    };

    for label in &labels {
        eprintln!("   {}", label);
    }
    println!("{}", json);
    Ok(())
}

async fn cmd_join(
    args: &DatasetArgs,
    geojson: &Path,
    year: i32,
    property: &str,
    output: Option<&Path>,
) -> CliResult {
    let ctx = args.load().await?;
    let regions = load_regions(geojson, property).await?;
    let fills = fill_for_year(&regions, &ctx.index, year);

    let matched = fills.iter().filter(|f| f.value.is_available()).count();
    eprintln!("🗺️  {} of {} regions have a value in {}", matched, fills.len(), year);

    let json = serde_json::to_string_pretty(&fills)?;
    write_output(&json, output)
}

async fn cmd_serve(
    port: Option<u16>,
    dataset: Option<PathBuf>,
    schema: Option<String>,
    geojson: Option<PathBuf>,
    static_dir: Option<PathBuf>,
) -> CliResult {
    let mut config = ServerConfig::from_env()?;

    if let Some(port) = port {
        config.port = port;
    }
    if let Some(schema) = schema {
        config.preset = schema.parse()?;
    }
    if dataset.is_some() {
        config.dataset = dataset;
    }
    if geojson.is_some() {
        config.geojson = geojson;
    }
    if static_dir.is_some() {
        config.static_dir = static_dir;
    }

    reshaper::server::start_server(config).await?;
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> CliResult {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
