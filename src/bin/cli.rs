use clap::{Parser, Subcommand};
use storefront_engine::{
    AppContext, FetchOutcome, FilterState, GameRecord, SortKey, SourceKind, StorefrontConfig,
};

#[derive(Parser)]
#[command(name = "storefront-cli")]
#[command(about = "Storefront Engine CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Storage path (overrides STOREFRONT_STORAGE_PATH)
    #[arg(short, long)]
    storage: Option<String>,

    /// Never call network sources
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse one page of the catalog
    Browse {
        /// Catalog source (primary, comparison, static)
        #[arg(long, default_value = "primary")]
        source: SourceKind,

        /// Search text
        #[arg(long)]
        search: Option<String>,

        /// Sort key (relevance, name-asc, name-desc, rating, released, price-low, price-high)
        #[arg(long, default_value = "relevance")]
        sort: SortKey,

        /// Genre filter (repeatable)
        #[arg(long)]
        genre: Vec<String>,

        /// Platform filter (repeatable)
        #[arg(long)]
        platform: Vec<String>,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Search every source at once
    Search {
        /// Search term
        term: String,
    },

    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show cart lines and totals
    Show,

    /// Add a game from a catalog source by id
    Add {
        id: String,

        #[arg(long, default_value = "static")]
        source: SourceKind,

        /// Search text used to locate the game on network sources
        #[arg(long)]
        search: Option<String>,
    },

    /// Remove a line
    Remove { id: String },

    /// Set a line's quantity (0 removes it)
    Qty { id: String, quantity: i64 },

    /// Empty the cart
    Clear,
}

fn print_games(games: &[GameRecord]) {
    for (i, game) in games.iter().enumerate() {
        let price = match (game.price, game.discount_percent()) {
            (Some(price), Some(discount)) => format!("{:.2} (-{:.0}%)", price, discount),
            (Some(price), None) => format!("{:.2}", price),
            (None, _) => "N/A".to_string(),
        };
        println!(
            "   {:>2}. [{}] {}  ★{:.1}  {}",
            i + 1,
            game.id,
            game.display_name(),
            game.rating,
            price
        );
    }
}

fn print_outcome(outcome: &FetchOutcome) {
    match outcome {
        FetchOutcome::Loaded { source, count } => println!("✅ {} game(s) from {}", count, source),
        FetchOutcome::FallbackApplied { failed, error } => {
            println!("⚠️  {} failed ({}), showing fallback catalog", failed, error)
        }
        FetchOutcome::Failed { error } => println!("❌ Fetch failed: {}", error),
    }
}

fn print_cart(app: &AppContext) {
    let cart = app.cart();
    if cart.lines().is_empty() {
        println!("🛒 Cart is empty");
        return;
    }

    println!("🛒 Cart:");
    for line in cart.lines() {
        println!(
            "   [{}] {} x{}  {:.2}",
            line.id(),
            line.game.name,
            line.quantity,
            line.subtotal()
        );
    }
    println!("   Items: {}", cart.cart_item_count());
    println!("   Total: {:.2}", cart.cart_total());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_engine=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = StorefrontConfig::from_env();
    if let Some(storage) = cli.storage {
        config.storage_path = storage;
    }
    if cli.offline {
        config.network_enabled = false;
    }

    let mut app = AppContext::new(config)?;

    match cli.command {
        Commands::Browse { source, search, sort, genre, platform, page } => {
            let filters = FilterState {
                search: search.unwrap_or_default(),
                sort,
                genres: genre.into_iter().collect(),
                platforms: platform.into_iter().collect(),
                ..Default::default()
            };

            let catalog = app.catalog_mut();
            let outcome = catalog.browse(source, filters, page).await;
            print_outcome(&outcome);

            let pagination = catalog.pagination();
            println!(
                "\n📋 Page {}/{} ({} results)",
                pagination.page, pagination.total_pages, pagination.total_results
            );
            print_games(catalog.filtered_games());
        }

        Commands::Search { term } => {
            println!("🔍 Searching for: {}", term);
            let result = app.catalog().global_search(&term).await;

            println!("\n✅ {} result(s)", result.count);
            print_games(&result.games);

            for failure in &result.failures {
                println!("⚠️  {} unavailable: {}", failure.source, failure.message);
            }
        }

        Commands::Cart { action } => match action {
            CartAction::Show => print_cart(&app),

            CartAction::Add { id, source, search } => {
                let filters = FilterState {
                    search: search.unwrap_or_default(),
                    ..Default::default()
                };
                app.catalog_mut().browse(source, filters, 1).await;

                if app.add_to_cart_by_id(&id) {
                    println!("✅ Added {}", id);
                } else {
                    println!("❌ Game {} not found in {} catalog", id, source);
                }
                print_cart(&app);
            }

            CartAction::Remove { id } => {
                app.cart_mut().remove_from_cart(&id);
                print_cart(&app);
            }

            CartAction::Qty { id, quantity } => {
                app.cart_mut().update_quantity(&id, quantity);
                print_cart(&app);
            }

            CartAction::Clear => {
                app.cart_mut().clear_cart();
                println!("🧹 Cart cleared");
            }
        },
    }

    Ok(())
}
