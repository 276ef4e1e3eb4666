use urur_api::endpoints::services::NewService;
use urur_api::{Client, DirectoryApiError, Request};
use uuid::Uuid;

#[tokio::main]
pub async fn main() -> Result<(), DirectoryApiError> {
    let client =
        Client::new("https://project.supabase.co", "anon_key")?.bearer_auth("access_token");

    let service = NewService::new(Uuid::nil(), "My Service", "https://example.com")
        .tagline("A short tagline");
    let req = Request::services().create(service);

    let _rows = client.send(req).await?;
    Ok(())
}
