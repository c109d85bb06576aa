use clap::{Args, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use futures::stream;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use mercato::api::{
  AddressRequest, ApiClient, DepositRequest, NotificationFilter, OrderFilter, Pagination, ProductFilter,
  SearchParams, TransactionFilter, TransferRequest, WithdrawRequest,
};
use mercato::auth::CookieJar;
use mercato::cache::{CacheStorage, NoopStorage, SqliteStorage};
use mercato::config::Config;
use mercato::query::{Mutation, QueryClient, QueryDefaults, QueryKey, QueryObserver, QueryState};
use mercato::realtime::{NotificationEvent, NotificationListener};
use mercato::{ApiError, Market};

#[derive(Parser, Debug)]
#[command(name = "mercato")]
#[command(about = "A caching terminal client for the marketplace API")]
#[command(version)]
struct Cli {
  /// Path to config file (default: $XDG_CONFIG_HOME/mercato/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Also print logs to stderr
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct PageArgs {
  #[arg(long, default_value_t = 1)]
  page: u32,
  #[arg(long, default_value_t = 10)]
  limit: u32,
}

impl PageArgs {
  fn pagination(self) -> Pagination {
    Pagination::new(self.page, self.limit)
  }
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Active storefront banners
  Banners,
  /// Browse the product catalogue
  Products {
    #[arg(long)]
    term: Option<String>,
    #[arg(long)]
    category: Option<u64>,
    #[command(flatten)]
    page: PageArgs,
  },
  /// Show one product
  Product { id: u64 },
  /// Your orders
  Orders {
    #[arg(long)]
    status: Option<String>,
    #[command(flatten)]
    page: PageArgs,
  },
  /// Show one order
  Order { id: u64 },
  #[command(subcommand)]
  Address(AddressCommand),
  #[command(subcommand)]
  Wallet(WalletCommand),
  #[command(subcommand)]
  Notifications(NotificationCommand),
  #[command(subcommand)]
  Rfq(RfqCommand),
  #[command(subcommand)]
  Dropship(DropshipCommand),
  /// Store a bearer token for later requests
  Login {
    #[arg(long)]
    token: String,
  },
  /// Forget the stored token and cached data
  Logout,
  #[command(subcommand)]
  Cache(CacheCommand),
}

/// Saved addresses
#[derive(Subcommand, Debug)]
enum AddressCommand {
  List {
    #[command(flatten)]
    page: PageArgs,
  },
  /// Add an address from a JSON object
  Add { json: String },
  /// Replace an address with a JSON object
  Update { id: u64, json: String },
  Delete { id: u64 },
}

/// Wallet balance and transfers
#[derive(Subcommand, Debug)]
enum WalletCommand {
  Balance,
  Transactions {
    /// DEPOSIT, WITHDRAWAL, TRANSFER, PAYMENT, REFUND
    #[arg(long = "type")]
    kind: Option<String>,
    #[command(flatten)]
    page: PageArgs,
  },
  Deposit {
    amount: f64,
    #[arg(long, default_value = "CARD")]
    method: String,
    #[arg(long)]
    reference: Option<String>,
  },
  Withdraw {
    amount: f64,
    #[arg(long)]
    bank_account: u64,
    #[arg(long)]
    remarks: Option<String>,
  },
  Transfer {
    receiver: u64,
    amount: f64,
    #[arg(long)]
    remarks: Option<String>,
  },
  /// Print the balance every time it changes
  Watch,
}

/// Notifications
#[derive(Subcommand, Debug)]
enum NotificationCommand {
  List {
    #[arg(long)]
    unread: bool,
    #[command(flatten)]
    page: PageArgs,
  },
  Unread,
  Read { id: u64 },
  ReadAll,
  /// Follow the unread count
  Watch {
    /// Read pushed events as JSON lines from stdin
    #[arg(long)]
    events_from_stdin: bool,
  },
}

/// Requests for quotation
#[derive(Subcommand, Debug)]
enum RfqCommand {
  Quotes {
    #[command(flatten)]
    page: PageArgs,
  },
  Cart,
}

/// Dropshipping
#[derive(Subcommand, Debug)]
enum DropshipCommand {
  List {
    #[arg(long)]
    term: Option<String>,
    #[command(flatten)]
    page: PageArgs,
  },
}

/// Offline cache
#[derive(Subcommand, Debug)]
enum CacheCommand {
  List,
  Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse();

  let data_dir = Config::data_dir()?;
  let _log_guard = mercato::logging::init(&data_dir, cli.verbose)?;

  let config = Config::load(cli.config.as_deref())?;

  let cookies = CookieJar::open(&data_dir.join("cookies"))?;
  if let Some(token) = Config::env_token() {
    cookies.set_transient(&config.auth.token_cookie, &token);
  }

  let storage: Arc<dyn CacheStorage> = if config.cache.persist {
    Arc::new(SqliteStorage::open(&data_dir.join("cache.db"))?)
  } else {
    Arc::new(NoopStorage)
  };

  let queries = QueryClient::with_storage(
    QueryDefaults {
      stale_time: config.cache.stale_time(),
      gc_time: config.cache.gc_time(),
    },
    storage,
  );
  match queries.hydrate() {
    Ok(loaded) => debug!(loaded, "loaded cached queries"),
    Err(e) => warn!(error = %e, "failed to load cached queries"),
  }

  let api = ApiClient::new(&config, cookies)?;
  let market = Market::new(api, queries);

  run(&market, cli.command).await
}

async fn run(market: &Market, command: Command) -> Result<()> {
  match command {
    Command::Banners => show(market.active_banners()).await,
    Command::Products { term, category, page } => {
      let filter = ProductFilter {
        search: SearchParams {
          page: page.pagination(),
          term,
        },
        category_id: category,
        ..Default::default()
      };
      show(market.products(filter)).await
    }
    Command::Product { id } => show(market.product(id)).await,
    Command::Orders { status, page } => {
      let filter = OrderFilter {
        search: SearchParams::new(page.pagination()),
        order_status: status,
        ..Default::default()
      };
      show(market.orders(filter)).await
    }
    Command::Order { id } => show(market.order(Some(id))).await,
    Command::Address(command) => run_address(market, command).await,
    Command::Wallet(command) => run_wallet(market, command).await,
    Command::Notifications(command) => run_notifications(market, command).await,
    Command::Rfq(RfqCommand::Quotes { page }) => show(market.rfq_quotes(page.pagination())).await,
    Command::Rfq(RfqCommand::Cart) => show(market.rfq_cart()).await,
    Command::Dropship(DropshipCommand::List { term, page }) => {
      let params = SearchParams {
        page: page.pagination(),
        term,
      };
      show(market.dropship_products(params)).await
    }
    Command::Login { token } => {
      let api = market.api();
      api.cookies().set(api.token_cookie(), &token)?;
      println!("Signed in");
      Ok(())
    }
    Command::Logout => {
      let api = market.api();
      api.cookies().remove(api.token_cookie())?;
      market.queries().storage().clear()?;
      market.queries().clear();
      println!("Signed out");
      Ok(())
    }
    Command::Cache(CacheCommand::List) => {
      for query in market.queries().storage().load_all()? {
        println!("{}  {}", query.cached_at.format("%Y-%m-%d %H:%M:%S"), query.key);
      }
      Ok(())
    }
    Command::Cache(CacheCommand::Clear) => {
      market.queries().storage().clear()?;
      println!("Cache cleared");
      Ok(())
    }
  }
}

async fn run_address(market: &Market, command: AddressCommand) -> Result<()> {
  match command {
    AddressCommand::List { page } => show(market.addresses(page.pagination())).await,
    AddressCommand::Add { json } => {
      let body: AddressRequest = serde_json::from_str(&json)?;
      submit(market.add_address(), body).await
    }
    AddressCommand::Update { id, json } => {
      let body: AddressRequest = serde_json::from_str(&json)?;
      submit(market.update_address(), (id, body)).await
    }
    AddressCommand::Delete { id } => submit(market.delete_address(), id).await,
  }
}

async fn run_wallet(market: &Market, command: WalletCommand) -> Result<()> {
  match command {
    WalletCommand::Balance => show(market.wallet_balance()).await,
    WalletCommand::Transactions { kind, page } => {
      let filter = TransactionFilter {
        page: page.pagination(),
        kind,
        ..Default::default()
      };
      show(market.wallet_transactions(filter)).await
    }
    WalletCommand::Deposit {
      amount,
      method,
      reference,
    } => {
      let body = DepositRequest {
        amount,
        payment_method: method,
        reference,
      };
      submit(market.deposit(), body).await
    }
    WalletCommand::Withdraw {
      amount,
      bank_account,
      remarks,
    } => {
      let body = WithdrawRequest {
        amount,
        bank_account_id: bank_account,
        remarks,
      };
      submit(market.withdraw(), body).await
    }
    WalletCommand::Transfer {
      receiver,
      amount,
      remarks,
    } => {
      let body = TransferRequest {
        receiver_id: receiver,
        amount,
        remarks,
      };
      submit(market.transfer(), body).await
    }
    WalletCommand::Watch => watch(market.wallet_balance()).await,
  }
}

async fn run_notifications(market: &Market, command: NotificationCommand) -> Result<()> {
  match command {
    NotificationCommand::List { unread, page } => {
      let filter = NotificationFilter {
        page: page.pagination(),
        unread_only: unread.then_some(true),
        ..Default::default()
      };
      show(market.notifications(filter)).await
    }
    NotificationCommand::Unread => show(market.unread_notifications()).await,
    NotificationCommand::Read { id } => submit(market.mark_notification_read(), id).await,
    NotificationCommand::ReadAll => submit(market.mark_all_notifications_read(), ()).await,
    NotificationCommand::Watch { events_from_stdin } => {
      let unread = market.unread_notifications();
      if !events_from_stdin {
        return watch(unread).await;
      }

      let listener = NotificationListener::new(market.queries().clone()).on_toast(|event| {
        eprintln!(
          "[{}] {}",
          event.title.as_deref().unwrap_or_default(),
          event.message.as_deref().unwrap_or_default()
        );
      });

      let lines = BufReader::new(tokio::io::stdin()).lines();
      let events = stream::unfold(lines, |mut lines| async move {
        loop {
          match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match NotificationEvent::decode(&line) {
              Ok(event) => return Some((event, lines)),
              Err(e) => warn!(error = %e, "skipping undecodable event"),
            },
            Ok(None) => return None,
            Err(e) => {
              warn!(error = %e, "failed to read events");
              return None;
            }
          }
        }
      });

      tokio::select! {
        _ = listener.run(events) => Ok(()),
        watched = watch(unread) => watched,
      }
    }
  }
}

/// Wait for the first settled state and print it.
async fn show(mut observer: QueryObserver) -> Result<()> {
  let state = observer
    .settled()
    .await
    .ok_or_else(|| eyre!("Query {} was dropped before it finished", observer.key()))?;
  print_state(observer.key(), &state)
}

/// Print every settled state until interrupted.
async fn watch(mut observer: QueryObserver) -> Result<()> {
  let key = observer.key().clone();
  if let Some(state) = observer.settled().await {
    print_state(&key, &state)?;
  }

  loop {
    tokio::select! {
      changed = observer.changed() => match changed {
        Some(state) if state.is_settled() => print_state(&key, &state)?,
        Some(_) => {}
        None => break,
      },
      _ = tokio::signal::ctrl_c() => break,
    }
  }
  Ok(())
}

fn print_state(key: &QueryKey, state: &QueryState) -> Result<()> {
  if !state.is_error() {
    return match state.data() {
      Some(data) => print_json(data),
      None => Ok(()),
    };
  }

  let Some(err) = state.error() else {
    return Ok(());
  };
  match state.data() {
    Some(data) if !err.is_unauthorized() => {
      warn!(key = %key, error = %err, "request failed, showing cached data");
      eprintln!("offline: {} (showing cached data)", err.message());
      print_json(data)
    }
    _ => Err(failure(err)),
  }
}

fn failure(err: &ApiError) -> color_eyre::Report {
  if err.is_unauthorized() {
    eyre!("{} (run `mercato login --token <token>` first)", err.message())
  } else {
    eyre!(err.message())
  }
}

async fn submit<P: Send + 'static>(mutation: Mutation<P>, params: P) -> Result<()> {
  let body = mutation
    .mutate(params)
    .await
    .map_err(|e| failure(&e))?;
  print_json(&body)
}

fn print_json(value: &Value) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
