use clap::{Parser, Subcommand};
use session_relay::{ApiClient, Session, Settings};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "session-relay", version, about = "Authenticated API client with transparent token refresh")]
struct Cli {
    /// 配置文件路径，不存在时写出默认配置
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 登录并保存会话
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// 以当前会话发起 GET 请求并输出响应体
    Get { path: String },
    /// 显示登录状态
    Status,
    /// 清除本地会话
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化配置
    let config = Settings::load(&cli.config)?;

    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log.level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session = Session::open(&config)?;
    let client = ApiClient::new(&config, session)?;

    match cli.command {
        Command::Login { username, password } => {
            let user = client.login(&username, &password).await?;
            match user {
                Some(user) => println!("logged in as {}", user.user_name),
                None => println!("logged in"),
            }
        }
        Command::Get { path } => {
            let response = client.get(&path).await?;
            println!("{}", response.status());
            println!("{}", response.text());
            if !client.is_logged_in() {
                tracing::warn!("session is no longer valid, please log in again");
            }
        }
        Command::Status => match (client.is_logged_in(), client.current_user()) {
            (true, Some(user)) => println!("logged in as {}", user.user_name),
            (true, None) => println!("logged in"),
            (false, _) => println!("not logged in"),
        },
        Command::Logout => {
            client.logout()?;
            println!("logged out");
        }
    }

    Ok(())
}
