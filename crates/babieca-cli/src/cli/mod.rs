//! CLI entry and dispatch.

use anyhow::{Context, Result};
use babieca_core::logging;
use babieca_types::{Role, UserType};
use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "babieca")]
#[command(version)]
#[command(about = "Babieca auction marketplace client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: Option<String>,
        /// Read from stdin when omitted
        #[arg(long, env = "BABIECA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create a bidder account and log in
    Register(RegisterArgs),
    /// Send a password recovery email
    ForgotPassword {
        #[arg(long)]
        email: Option<String>,
    },
    /// Log out and forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,

    /// Browse auctions
    Auctions {
        #[command(subcommand)]
        command: AuctionCommands,
    },
    /// Place a bid on an auction
    Bid {
        /// Auction id or document id
        #[arg(value_name = "AUCTION_ID")]
        auction: String,
        /// Amount in euros, above the current bid
        amount: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Administration (admin and superadmin only)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args)]
struct RegisterArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    username: Option<String>,
    /// Read from stdin when omitted
    #[arg(long, env = "BABIECA_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    /// particular or profesional
    #[arg(long, default_value = "particular")]
    user_type: UserType,
    #[arg(long, default_value = "")]
    phone: String,
}

#[derive(clap::Subcommand)]
enum AuctionCommands {
    /// List auctions
    List {
        /// Only auctions open for bids
        #[arg(long, conflicts_with = "finished")]
        active: bool,
        /// Only finished or cancelled auctions
        #[arg(long)]
        finished: bool,
    },
    /// Auctions you have bid on
    Mine,
    /// Show an auction and its bid history
    Show {
        #[arg(value_name = "AUCTION_ID")]
        id: String,
    },
}

#[derive(clap::Subcommand)]
enum ProfileCommands {
    /// Show your profile
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

#[derive(clap::Subcommand)]
enum AdminCommands {
    /// Manage auctions
    Auctions {
        #[command(subcommand)]
        command: AdminAuctionCommands,
    },
    /// Manage users
    Users {
        #[command(subcommand)]
        command: AdminUserCommands,
    },
}

#[derive(clap::Subcommand)]
enum AdminAuctionCommands {
    /// List active auctions, or finished ones with their winners
    List {
        #[arg(long)]
        finished: bool,
    },
    /// Create an auction
    Create(CreateAuctionArgs),
    /// Cancel an auction
    Cancel {
        #[arg(value_name = "AUCTION_ID")]
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Update payment, collection or winner of an auction
    Update {
        #[arg(value_name = "AUCTION_ID")]
        id: String,
        #[arg(long)]
        paid: Option<bool>,
        #[arg(long)]
        collected: Option<bool>,
        /// Winner user id
        #[arg(long)]
        winner: Option<String>,
    },
}

#[derive(clap::Args)]
struct CreateAuctionArgs {
    #[arg(long)]
    name: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Image URL (repeatable)
    #[arg(long = "image", value_name = "URL")]
    images: Vec<String>,
    /// Document URL
    #[arg(long, default_value = "")]
    documents: String,
    /// Start date (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
    #[arg(long)]
    start: String,
    /// End date (YYYY-MM-DD, YYYY-MM-DDTHH:MM or RFC 3339)
    #[arg(long)]
    end: String,
    #[arg(long)]
    starting_price: String,
    #[arg(long, short)]
    yes: bool,
}

#[derive(clap::Subcommand)]
enum AdminUserCommands {
    /// List users
    List,
    /// Create a user with a role
    Create {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "BABIECA_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long, default_value = "user")]
        role: Role,
        #[arg(long, default_value = "particular")]
        user_type: UserType,
        #[arg(long, default_value = "")]
        phone: String,
    },
    /// Block a user
    Block {
        #[arg(value_name = "USER_ID")]
        id: String,
    },
    /// Unblock a user
    Unblock {
        #[arg(value_name = "USER_ID")]
        id: String,
    },
    /// Change a user's role
    Role {
        #[arg(value_name = "USER_ID")]
        id: String,
        role: Role,
    },
    /// Delete a user
    Delete {
        #[arg(value_name = "USER_ID")]
        id: String,
        #[arg(long, short)]
        yes: bool,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Generate a fresh config from Rust defaults (for xtask)
    Generate,
    /// Save the backend API base URL
    SetUrl { url: String },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(email, password).await,
        Commands::Register(args) => {
            commands::auth::register(commands::auth::RegisterOptions {
                email: args.email,
                username: args.username,
                password: args.password,
                user_type: args.user_type,
                phone: args.phone,
            })
            .await
        }
        Commands::ForgotPassword { email } => commands::auth::forgot_password(email).await,
        Commands::Logout => commands::auth::logout(),
        Commands::Whoami => commands::auth::whoami().await,

        Commands::Auctions { command } => match command {
            AuctionCommands::List { active, finished } => {
                let filter = match (active, finished) {
                    (true, _) => commands::auctions::Filter::Active,
                    (_, true) => commands::auctions::Filter::Finished,
                    _ => commands::auctions::Filter::All,
                };
                commands::auctions::list(filter).await
            }
            AuctionCommands::Mine => commands::auctions::mine().await,
            AuctionCommands::Show { id } => commands::auctions::show(&id).await,
        },

        Commands::Bid {
            auction,
            amount,
            yes,
        } => commands::bid::place(&auction, &amount, yes).await,

        Commands::Profile { command } => match command {
            ProfileCommands::Show => commands::profile::show().await,
            ProfileCommands::Update {
                username,
                email,
                phone,
            } => commands::profile::update(username, email, phone).await,
        },

        Commands::Admin { command } => match command {
            AdminCommands::Auctions { command } => match command {
                AdminAuctionCommands::List { finished } => {
                    commands::admin::list_auctions(finished).await
                }
                AdminAuctionCommands::Create(args) => {
                    commands::admin::create_auction(
                        babieca_core::forms::AuctionForm {
                            name: args.name,
                            description: args.description,
                            images: args.images,
                            documents: args.documents,
                            start_date: args.start,
                            end_date: args.end,
                            starting_price: args.starting_price,
                        },
                        args.yes,
                    )
                    .await
                }
                AdminAuctionCommands::Cancel { id, yes } => {
                    commands::admin::cancel_auction(&id, yes).await
                }
                AdminAuctionCommands::Update {
                    id,
                    paid,
                    collected,
                    winner,
                } => {
                    let updates = babieca_types::AuctionUpdate {
                        is_active: None,
                        is_paid: paid,
                        is_collected: collected,
                        winner,
                    };
                    commands::admin::update_auction(&id, &updates).await
                }
            },
            AdminCommands::Users { command } => match command {
                AdminUserCommands::List => commands::admin::list_users().await,
                AdminUserCommands::Create {
                    username,
                    email,
                    password,
                    role,
                    user_type,
                    phone,
                } => {
                    commands::admin::create_user(commands::admin::CreateUserOptions {
                        username,
                        email,
                        password,
                        role,
                        user_type,
                        phone,
                    })
                    .await
                }
                AdminUserCommands::Block { id } => commands::admin::set_blocked(&id, true).await,
                AdminUserCommands::Unblock { id } => {
                    commands::admin::set_blocked(&id, false).await
                }
                AdminUserCommands::Role { id, role } => commands::admin::set_role(&id, role).await,
                AdminUserCommands::Delete { id, yes } => {
                    commands::admin::delete_user(&id, yes).await
                }
            },
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
            ConfigCommands::Generate => commands::config::generate(),
            ConfigCommands::SetUrl { url } => commands::config::set_url(&url),
        },
    }
}
