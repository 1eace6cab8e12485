use std::error::Error;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use socket_chat::config::{self, AppConfig};
use socket_chat::network::{RelayServer, WsClient};
use socket_chat::storage::{self, AuditDatabase};
use socket_chat::ui::ChatApp;
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(
    name = "socket_chat",
    version,
    about = "Realtime chat client and relay server"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// WebSocket URL of the chat server
    #[arg(long, env = "CHAT_SERVER_URL")]
    server_url: Option<String>,
    /// Display name shown next to your messages
    #[arg(long, env = "CHAT_USERNAME")]
    username: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Run the relay server (no UI)
    Server {
        /// Address to listen on, e.g. 0.0.0.0:8080
        #[arg(long)]
        listen: Option<String>,
        /// SQLite file for the audit trail
        #[arg(long, value_name = "FILE")]
        audit_db: Option<String>,
    },
    /// Print the newest audit entries
    Audit {
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long, value_name = "FILE")]
        audit_db: Option<String>,
    },
    /// Write the effective configuration to the config file
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    // Khởi tạo Logger để debug
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    if let Some(server_url) = cli.server_url {
        app_config.server_url = server_url;
    }
    if let Some(username) = cli.username {
        app_config.username = username;
    }

    match cli.mode {
        Some(Mode::Server { listen, audit_db }) => {
            if let Some(listen) = listen {
                app_config.listen_addr = listen;
            }
            if let Some(audit_db) = audit_db {
                app_config.audit_db_path = audit_db;
            }
            run_server(&app_config).await?;
        }
        Some(Mode::Audit { limit, audit_db }) => {
            let path = audit_db.unwrap_or(app_config.audit_db_path);
            print_audit(&path, limit)?;
        }
        Some(Mode::InitConfig) => {
            config::save_config(&cli.config, &app_config)?;
            log::info!("Wrote configuration to {}", cli.config);
        }
        None => run_full_client(app_config)?,
    }

    Ok(())
}

async fn run_server(app_config: &AppConfig) -> Result<(), Box<dyn Error>> {
    storage::ensure_parent_dir(&app_config.audit_db_path)?;
    let audit_db = AuditDatabase::with_path(&app_config.audit_db_path)?;
    log::info!(
        "Audit trail {} holds {} entries",
        app_config.audit_db_path,
        audit_db.count()?
    );

    let audit = storage::spawn_audit_writer(audit_db);
    let server = RelayServer::bind(&app_config.listen_addr, audit).await?;
    if let Err(err) = server.run().await {
        log::error!("Relay server terminated unexpectedly: {err}");
        let err: Box<dyn Error> = err;
        return Err(err);
    }
    Ok(())
}

fn print_audit(path: &str, limit: usize) -> Result<(), Box<dyn Error>> {
    let audit_db = AuditDatabase::with_path(path)?;
    for record in audit_db.recent(limit)?.into_iter().rev() {
        println!(
            "{} - User: {}, IP: {}, Action: {}, Details: {}",
            record.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            record.username,
            record.ip_address,
            record.action,
            record.details
        );
    }
    Ok(())
}

fn run_full_client(app_config: AppConfig) -> Result<(), eframe::Error> {
    // 1. Tạo các kênh giao tiếp (Channels)
    // UI -> Network
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // Network -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    // 2. Khởi chạy Network Task (Chạy ngầm)
    let AppConfig {
        server_url,
        username,
        ..
    } = app_config;
    log::info!("Joining {server_url} as {username}");
    tokio::spawn(async move {
        let client = WsClient::new(event_tx, cmd_rx, server_url, username);
        if let Err(err) = client.run().await {
            log::error!("Network client terminated: {err}");
        }
    });

    // 3. Khởi chạy UI (Chạy trên Main Thread)
    let options = eframe::NativeOptions::default();
    eframe::run_native(
        "Socket Chat",
        options,
        Box::new(move |cc| Ok(Box::new(ChatApp::new(cc, cmd_tx, event_rx)))),
    )
}
