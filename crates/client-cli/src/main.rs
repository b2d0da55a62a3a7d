use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use basket::api::ApiClient;
use basket::auth::{CredentialsUpdate, LoginForm, ProfileUpdate, RegisterForm};
use basket::config::Config;
use basket::session::decode_token;
use basket::share::load_shared;
use basket::storage::LocalStore;
use basket::Store;
use shared::routes::{Navigation, Route};
use shared::view::SortSpec;
use shared::{ItemChanges, ListMeta, NewItem, ShoppingItem, User};

#[derive(Parser)]
#[command(name = "basket")]
#[command(about = "Shopping lists backed by a basket resource store")]
#[command(version)]
struct Cli {
    /// Resource store URL (overrides BASKET_API_URL and config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        surname: String,
        #[arg(long, default_value = "")]
        cell: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the local session
    Logout,
    /// Show current login status
    Whoami,
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Manage your shopping lists
    Lists {
        #[command(subcommand)]
        action: ListAction,
    },
    /// Manage the items on a list
    Items {
        #[command(subcommand)]
        action: ItemAction,
    },
    /// Show a shared list without logging in
    Share { list_id: String },
    /// Check whether a route would render for the current session
    Open { path: String },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        cell: Option<String>,
    },
    /// Change email and/or password
    Credentials {
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_email: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
    },
}

#[derive(Subcommand)]
enum ListAction {
    Ls,
    Create {
        title: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    Rename {
        list_id: String,
        title: String,
    },
    /// Update category, notes or image
    Meta {
        list_id: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        image_url: Option<String>,
    },
    /// Delete a list and all of its items
    Rm { list_id: String },
    /// Print the public share link for a list
    Share { list_id: String },
}

#[derive(Subcommand)]
enum ItemAction {
    Ls {
        list_id: String,
        /// Only items whose name contains this text
        #[arg(long, default_value = "")]
        q: String,
        /// name|category|date . asc|desc
        #[arg(long, default_value = "date.desc")]
        sort: SortSpec,
    },
    Add {
        list_id: String,
        name: String,
        #[arg(long, default_value_t = 1.0)]
        qty: f64,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long = "image")]
        images: Vec<String>,
    },
    Edit {
        list_id: String,
        item_id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        qty: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Toggle { list_id: String, item_id: String },
    Inc { list_id: String, item_id: String },
    Dec { list_id: String, item_id: String },
    Rm { list_id: String, item_id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, data_dir)
        key: String,
        value: String,
    },
    /// Get a configuration value
    Get { key: String },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "basket=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::load().unwrap_or_default();
    let api = ApiClient::new(config.resolve_api_url(cli.api_url));
    let local = LocalStore::open(config.data_dir()?)?;
    let mut store = Store::new(api, local);
    tracing::debug!("Using resource store at {}", store.api.base_url());

    match cli.command {
        Commands::Register {
            email,
            password,
            name,
            surname,
            cell,
        } => {
            if !allowed(&store, Route::Signup) {
                return Ok(());
            }
            let mut form = RegisterForm {
                email,
                password,
                name,
                surname,
                cell_number: cell,
            };
            let registration = store.auth.register(&mut form).await?;
            println!("\x1b[32m✅ Registered {}\x1b[0m", registration.user.email);
            println!("Run '\x1b[1mbasket login\x1b[0m' to sign in.");
        }
        Commands::Login { email, password } => {
            if !allowed(&store, Route::Login) {
                return Ok(());
            }
            let mut form = LoginForm { email, password };
            let user = store.auth.login(&mut store.session, &mut form).await?;
            println!("\x1b[1;32m✅ Logged in as {}\x1b[0m", user.email);
        }
        Commands::Logout => {
            store.auth.logout(&mut store.session)?;
            println!("\x1b[32m✅ Logged out\x1b[0m");
        }
        Commands::Whoami => match (store.session.current_user(), store.session.token()) {
            (Some(user), Some(token)) => {
                println!("\x1b[32m✓ Logged in\x1b[0m as {} ({})", user.email, user.id);
                if let Ok(claims) = decode_token(token) {
                    let issued = chrono::DateTime::from_timestamp_millis(claims.issued_at)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_default();
                    println!("Session started: {}", issued);
                }
                println!("Store: {}", store.api.base_url());
            }
            _ => not_logged_in(),
        },
        Commands::Profile { action } => {
            let Some(user) = current_user(&store, Route::Profile) else {
                return Ok(());
            };
            handle_profile_command(&mut store, &user, action).await?;
        }
        Commands::Lists { action } => {
            let Some(user) = current_user(&store, Route::Dashboard) else {
                return Ok(());
            };
            handle_list_command(&mut store, &user, action).await?;
        }
        Commands::Items { action } => {
            handle_item_command(&mut store, action).await?;
        }
        Commands::Share { list_id } => {
            let shared = load_shared(&store.api, &list_id).await?;
            println!("\x1b[1m{}\x1b[0m", shared.list.title);
            println!(
                "\x1b[90mShared list • Items: {} • Total quantity: {}\x1b[0m",
                shared.items.len(),
                shared.total_quantity
            );
            for item in &shared.items {
                print_item(item);
            }
        }
        Commands::Open { path } => match Route::parse(&path) {
            Some(route) => match store.navigate(route) {
                Navigation::Render(route) => println!("render {}", route),
                Navigation::Redirect(route) => println!("redirect {}", route),
            },
            None => anyhow::bail!("Unknown route: {}", path),
        },
        Commands::Config { action } => handle_config_command(action)?,
    }

    Ok(())
}

fn not_logged_in() {
    eprintln!("\x1b[33m🔐 Not logged in.\x1b[0m");
    eprintln!("   Run '\x1b[1mbasket login\x1b[0m' to authenticate.");
}

/// Run the route guard; prints where the visitor would be sent instead
fn allowed(store: &Store, route: Route) -> bool {
    match store.navigate(route) {
        Navigation::Render(_) => true,
        Navigation::Redirect(Route::Login) => {
            not_logged_in();
            false
        }
        Navigation::Redirect(to) => {
            eprintln!("\x1b[33mAlready logged in (would redirect to {}).\x1b[0m", to);
            eprintln!("   Run '\x1b[1mbasket logout\x1b[0m' first.");
            false
        }
    }
}

fn current_user(store: &Store, route: Route) -> Option<User> {
    if !allowed(store, route) {
        return None;
    }
    store.session.current_user().cloned()
}

/// Lists outside the user's cached set are treated as missing
fn ensure_owned(store: &Store, list_id: &str) -> Result<()> {
    if store.lists.select_by_id(list_id).is_none() {
        anyhow::bail!("List {} not found", list_id);
    }
    Ok(())
}

fn print_item(item: &ShoppingItem) {
    let mark = if item.purchased { "\x1b[32m[x]\x1b[0m" } else { "[ ]" };
    let mut details = vec![format!("qty {}", item.quantity)];
    if let Some(category) = &item.category {
        details.push(category.clone());
    }
    if let Some(notes) = &item.notes {
        details.push(notes.clone());
    }
    println!("{} {}  \x1b[90m{} • {}\x1b[0m", mark, item.name, item.id, details.join(" • "));
}

async fn handle_profile_command(store: &mut Store, user: &User, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show => {
            let profile = store.auth.fetch_profile(&user.id).await?;
            println!("email: {}", profile.email);
            println!("name: {}", profile.name);
            println!("surname: {}", profile.surname);
            println!("cell: {}", profile.cell_number);
        }
        ProfileAction::Update { name, surname, cell } => {
            let update = ProfileUpdate {
                name,
                surname,
                cell_number: cell,
            };
            match store.auth.update_profile(&mut store.session, &user.id, &update).await? {
                Some(_) => println!("\x1b[32m✅ Profile updated\x1b[0m"),
                None => println!("Nothing to update"),
            }
        }
        ProfileAction::Credentials {
            old_password,
            new_email,
            new_password,
        } => {
            let update = CredentialsUpdate {
                old_password,
                new_email,
                new_password,
            };
            match store
                .auth
                .update_credentials(&mut store.session, &user.id, &update)
                .await?
            {
                Some(updated) => println!("\x1b[32m✅ Credentials updated for {}\x1b[0m", updated.email),
                None => println!("Nothing to update"),
            }
        }
    }
    Ok(())
}

async fn handle_list_command(store: &mut Store, user: &User, action: ListAction) -> Result<()> {
    store.lists.fetch_for_user(&user.id).await?;

    match action {
        ListAction::Ls => {
            let lists = store.lists.select_by_user(&user.id);
            if lists.is_empty() {
                println!("No lists yet. Create one with 'basket lists create <title>'.");
            }
            for list in lists {
                let category = list.category.as_deref().unwrap_or("");
                println!("{}  {}  \x1b[90m{}\x1b[0m", list.id, list.title, category);
            }
        }
        ListAction::Create {
            title,
            category,
            notes,
            image_url,
        } => {
            let meta = ListMeta {
                category,
                notes,
                image_url,
            };
            let list = store.lists.create_list(&user.id, &title, meta).await?;
            println!("\x1b[32m✅ Created {} ({})\x1b[0m", list.title, list.id);
        }
        ListAction::Rename { list_id, title } => {
            ensure_owned(store, &list_id)?;
            let list = store.lists.rename_list(&list_id, &title).await?;
            println!("\x1b[32m✅ Renamed to {}\x1b[0m", list.title);
        }
        ListAction::Meta {
            list_id,
            category,
            notes,
            image_url,
        } => {
            ensure_owned(store, &list_id)?;
            let meta = ListMeta {
                category,
                notes,
                image_url,
            };
            store.lists.update_list_meta(&list_id, meta).await?;
            println!("\x1b[32m✅ Updated {}\x1b[0m", list_id);
        }
        ListAction::Rm { list_id } => {
            ensure_owned(store, &list_id)?;
            store.delete_list(&list_id).await?;
            println!("\x1b[32m✅ Deleted {}\x1b[0m", list_id);
        }
        ListAction::Share { list_id } => {
            ensure_owned(store, &list_id)?;
            let code = store.lists.ensure_share_code(&list_id).await?;
            println!("Share link: {}", Route::Share(list_id.clone()));
            println!("\x1b[90mShare code: {}\x1b[0m", code);
        }
    }
    Ok(())
}

async fn handle_item_command(store: &mut Store, action: ItemAction) -> Result<()> {
    let list_id = match &action {
        ItemAction::Ls { list_id, .. }
        | ItemAction::Add { list_id, .. }
        | ItemAction::Edit { list_id, .. }
        | ItemAction::Toggle { list_id, .. }
        | ItemAction::Inc { list_id, .. }
        | ItemAction::Dec { list_id, .. }
        | ItemAction::Rm { list_id, .. } => list_id.clone(),
    };

    let Some(user) = current_user(store, Route::ListItems(list_id.clone())) else {
        return Ok(());
    };
    store.lists.fetch_for_user(&user.id).await?;
    ensure_owned(store, &list_id)?;
    store.items.fetch_by_list(&list_id).await?;

    match action {
        ItemAction::Ls { q, sort, .. } => {
            let view = store.items.view(&list_id, &q, sort);
            if view.is_empty() {
                println!("No items");
            }
            for item in view {
                print_item(item);
            }
        }
        ItemAction::Add {
            name,
            qty,
            category,
            notes,
            images,
            ..
        } => {
            let new_item = NewItem {
                name,
                quantity: qty,
                category,
                notes,
                images: (!images.is_empty()).then_some(images),
            };
            let item = store.items.add_item(&list_id, new_item).await?;
            print_item(&item);
        }
        ItemAction::Edit {
            item_id,
            name,
            qty,
            category,
            notes,
            ..
        } => {
            let changes = ItemChanges {
                name,
                quantity: qty,
                category,
                notes,
                ..ItemChanges::default()
            };
            let item = store.items.update_item(&list_id, &item_id, changes).await?;
            print_item(&item);
        }
        ItemAction::Toggle { item_id, .. } => {
            let item = store.items.toggle_purchased(&list_id, &item_id).await?;
            print_item(&item);
        }
        ItemAction::Inc { item_id, .. } => {
            let item = store.items.increment(&list_id, &item_id).await?;
            print_item(&item);
        }
        ItemAction::Dec { item_id, .. } => {
            let item = store.items.decrement(&list_id, &item_id).await?;
            print_item(&item);
        }
        ItemAction::Rm { item_id, .. } => {
            store.items.delete_item(&list_id, &item_id).await?;
            println!("\x1b[32m✅ Deleted {}\x1b[0m", item_id);
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = Config::load().unwrap_or_default();
            match key.as_str() {
                "api_url" => config.remote.api_url = Some(value),
                "data_dir" => config.local.data_dir = Some(value),
                _ => anyhow::bail!("Unknown config key: {}. Valid keys: api_url, data_dir", key),
            }
            config.save()?;
            println!("Configuration saved");
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            let value = match key.as_str() {
                "api_url" => config.resolve_api_url(None),
                "data_dir" => config.data_dir()?.display().to_string(),
                _ => anyhow::bail!("Unknown config key: {}", key),
            };
            println!("{}", value);
        }
        ConfigAction::Show => {
            let config = Config::load()?;
            println!("api_url: {}", config.resolve_api_url(None));
            println!("data_dir: {}", config.data_dir()?.display());
        }
        ConfigAction::Path => {
            let path = Config::config_path()?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
