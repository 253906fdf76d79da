use jj2_client::client::Jj2Client;
use jj2_client::config::SessionConfig;
use jj2_client::packet::LocalPlayer;

#[tokio::main]
async fn main() {
    let client = Jj2Client::new(SessionConfig::default(), Vec::<LocalPlayer>::new());

    let (mut connection, _shutdown) = client
        .connect("127.0.0.1", 10052)
        .await
        .expect("failed to connect");
    connection.join().await.expect("failed to submit join request");

    if let Err(error) = connection.run().await {
        eprintln!("connection ended: {error}");
    }
}
