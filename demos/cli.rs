use clap::Parser;
use jj2_client::client::Jj2Client;
use jj2_client::config::SessionConfig;
use jj2_client::packet::{Character, LocalPlayer, Team};

#[derive(Parser)]
#[clap(name = "jj2-client", version)]
struct Args {
    /// Hostname or IP address of the server to join
    #[clap(short = 'a', long, default_value = "127.0.0.1")]
    address: String,

    /// TCP/UDP port the server is listening on
    #[clap(short = 'p', long, default_value_t = 10052)]
    port: u16,

    /// Name to present as the local player
    #[clap(short = 'n', long, default_value = "Jazz")]
    name: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let local_player = LocalPlayer::new(0, Team::Blue, Character::Jazz, [0, 0, 0, 0], args.name);
    let client = Jj2Client::new(SessionConfig::default(), vec![local_player]);

    let (mut connection, _shutdown) = client
        .connect(&args.address, args.port)
        .await
        .expect("failed to connect");
    connection.join().await.expect("failed to submit join request");

    if let Err(error) = connection.run().await {
        eprintln!("connection ended: {error}");
    }
}
