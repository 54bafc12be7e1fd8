mod common;

use common::*;
use docrepo::config::CONNECTION_STRING_ENV;

#[tokio::test]
async fn default_endpoint_comes_from_the_environment() {
    // SAFETY: this is the only test in this binary, so nothing reads the
    // environment concurrently.
    unsafe { std::env::set_var(CONNECTION_STRING_ENV, "memory://default-endpoint") };

    let customers = docrepo::repository::<IntCustomer>().await.unwrap();
    let manager = docrepo::manager::<IntCustomer>().await.unwrap();

    customers.add(IntCustomer { id: 7, name: "env".into() }).await.unwrap();

    let explicit = docrepo::repository_at::<IntCustomer>(&endpoint("default-endpoint"))
        .await
        .unwrap();
    assert_eq!(explicit.get_by_id(&7).await.unwrap().unwrap().name, "env");
    assert!(manager.exists().await.unwrap());
}
