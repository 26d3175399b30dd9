use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sheet_cutter::config::OptimizerConfig;
use sheet_cutter::grid::StockSheet;
use sheet_cutter::observation::{Info, Observation, Product, StockEntry, fitness};
use sheet_cutter::optimizer::Optimizer;
use sheet_cutter::policy::{FirstFit, Policy};
use sheet_cutter::render;
use sheet_cutter::types::{Action, Position, Rect, StockType};
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "sheet_cutter",
    about = "2D cutting stock via column generation"
)]
struct Cli {
    /// Job file: {"stocks": [[w, h, cost], ...], "pieces": [{"size": [w, h], "quantity": n}, ...]}
    #[arg(long)]
    job: PathBuf,

    /// Optimizer settings as JSON (missing fields take defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = PolicyKind::ColumnGeneration)]
    policy: PolicyKind,

    /// Stop after this many decisions
    #[arg(long, default_value_t = 1000)]
    max_steps: usize,

    /// Stop after this many consecutive decisions that place nothing
    #[arg(long, default_value_t = 5)]
    patience: usize,

    /// Show ASCII layout of each used sheet
    #[arg(long)]
    layout: bool,

    #[arg(long, default_value_t = Level::WARN)]
    log_level: Level,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyKind {
    ColumnGeneration,
    FirstFit,
}

#[derive(Deserialize)]
struct Job {
    stocks: Vec<StockType>,
    pieces: Vec<Product>,
}

struct Placed {
    product_idx: usize,
    size: Rect,
    position: Position,
}

/// In-memory stand-in for the cutting environment.
struct Episode {
    sheets: Vec<StockSheet>,
    costs: Vec<f64>,
    products: Vec<Product>,
    placed: Vec<Vec<Placed>>,
}

impl Episode {
    fn new(job: Job) -> Self {
        let sheets: Vec<StockSheet> = job
            .stocks
            .iter()
            .map(|s| StockSheet::new(s.width, s.height))
            .collect();
        Self {
            placed: sheets.iter().map(|_| Vec::new()).collect(),
            costs: job.stocks.iter().map(|s| s.cost).collect(),
            sheets,
            products: job.pieces,
        }
    }

    fn observation(&self) -> Observation {
        Observation {
            products: self.products.clone(),
            stocks: self
                .sheets
                .iter()
                .zip(&self.costs)
                .map(|(sheet, &cost)| StockEntry::Priced {
                    grid: sheet.cells().to_vec(),
                    cost,
                })
                .collect(),
        }
    }

    fn done(&self) -> bool {
        self.products.iter().all(|p| p.quantity == 0)
    }

    /// Applies an action; returns whether a piece was cut.
    fn step(&mut self, action: Action) -> bool {
        let Some(stock_idx) = action.stock_index() else {
            return false;
        };
        let Some(product_idx) = self
            .products
            .iter()
            .position(|p| p.size == action.size && p.quantity > 0)
        else {
            tracing::info!(%action, "rejected: no outstanding product of that size");
            return false;
        };
        let Some(sheet) = self.sheets.get_mut(stock_idx) else {
            tracing::info!(%action, "rejected: no such stock");
            return false;
        };
        if !sheet.fill(action.position, action.size, product_idx) {
            tracing::info!(%action, "rejected: overlaps or exceeds the sheet");
            return false;
        }
        self.products[product_idx].quantity -= 1;
        self.placed[stock_idx].push(Placed {
            product_idx,
            size: action.size,
            position: action.position,
        });
        true
    }

    fn info(&self) -> Info {
        let used: Vec<&StockSheet> = self.sheets.iter().filter(|s| !s.is_untouched()).collect();
        let area: u64 = used.iter().map(|s| s.area()).sum();
        let filled: u64 = used.iter().map(|s| s.filled_area()).sum();
        Info {
            filled_ratio: if area == 0 {
                0.0
            } else {
                filled as f64 / area as f64
            },
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &PathBuf) -> Result<T, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    serde_json::from_str(&text).map_err(|e| format!("invalid {}: {}", path.display(), e))
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(cli.log_level)
        .init();

    let job: Job = read_json(&cli.job).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });
    let config: OptimizerConfig = match &cli.config {
        Some(path) => read_json(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => OptimizerConfig::default(),
    };

    let mut policy: Box<dyn Policy> = match cli.policy {
        PolicyKind::ColumnGeneration => Box::new(Optimizer::new(config)),
        PolicyKind::FirstFit => Box::new(FirstFit),
    };

    let mut episode = Episode::new(job);
    let mut idle = 0;
    let mut steps = 0;
    while steps < cli.max_steps && !episode.done() && idle < cli.patience {
        let action = policy.action(&episode.observation()).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        steps += 1;
        if episode.step(action) {
            idle = 0;
        } else {
            idle += 1;
        }
    }
    tracing::info!(steps, done = episode.done(), "episode finished");

    let mut sheets_used = 0;
    let mut total_cost = 0.0;
    for (i, placed) in episode.placed.iter().enumerate() {
        if placed.is_empty() {
            continue;
        }
        sheets_used += 1;
        total_cost += episode.costs[i];
        println!("Stock {} ({}):", i, episode.sheets[i].size());
        for p in placed {
            println!("  #{} {} @ {}", p.product_idx, p.size, p.position);
        }
        if cli.layout {
            print!("{}", render::render_sheet(&episode.sheets[i]));
        }
        println!();
    }

    let info = episode.info();
    let outstanding: u32 = episode.products.iter().map(|p| p.quantity).sum();
    println!(
        "Summary: {} sheet{} used, cost {:.2}, {:.1}% waste, {} piece{} outstanding, fitness {:.4}",
        sheets_used,
        if sheets_used == 1 { "" } else { "s" },
        total_cost,
        (1.0 - info.filled_ratio) * 100.0,
        outstanding,
        if outstanding == 1 { "" } else { "s" },
        fitness(&episode.observation(), &info),
    );
    if outstanding > 0 {
        std::process::exit(2);
    }
}
