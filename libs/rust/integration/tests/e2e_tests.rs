//! End-to-end scenarios: sign in, release a batch, sign out.
//!
//! Tests validate:
//! - A check-in failure drops only the affected item
//! - Sign-out failures still release the session, and a new one opens cleanly
//! - Item failures never stop the rest of a batch

use passwordsafe_client::{Authenticator, ClientConfig, ErrorKind, ManagedAccountWorkflow};
use passwordsafe_integration_tests::{init_scenario_tracing, scenario_config};
use proptest::prelude::*;
use secrecy::ExposeSecret;
use std::collections::HashMap;
use test_utils::MockPasswordSafe;

#[tokio::test]
async fn test_check_in_failure_drops_second_item() {
    init_scenario_tracing();
    let mock = MockPasswordSafe::start().await;
    mock.mount_auth().await;
    mock.mount_sign_out(200).await;
    mock.mount_managed_account("sysA", "acct1", 1, 1).await;
    mock.mount_managed_account("sysA", "acct2", 1, 2).await;
    mock.mount_request("124").await;
    mock.mount_credential("124", "secretA").await;
    mock.mount_check_in_times("124", 204, Some(1)).await;
    mock.mount_check_in("124", 504).await;

    let session = Authenticator::new(scenario_config(&mock))
        .unwrap()
        .authenticate()
        .await
        .unwrap();

    let result = ManagedAccountWorkflow::new(&session)
        .get_managed_accounts(&["sysA/acct1", "sysA/acct2"])
        .await;

    assert_eq!(result.len(), 1);
    assert_eq!(result.get("sysA/acct1").unwrap().expose_secret(), "secretA");
    assert!(result.get("sysA/acct2").is_none());

    let err = result.last_error.as_ref().unwrap();
    assert_eq!(err.kind(), ErrorKind::Technical);
    let message = err.to_string();
    assert!(message.starts_with("sysA/acct2: check-in failed"), "{message}");
    assert!(message.contains("504"), "{message}");

    // first check-in, then the 504 retried until the budget ran out
    assert!(mock.request_count("PUT", "Requests/124/checkin").await > 2);

    session.sign_out().await.unwrap();
}

#[tokio::test]
async fn test_sign_out_rejection_still_releases_session() {
    init_scenario_tracing();
    let mock = MockPasswordSafe::start().await;
    mock.mount_auth().await;
    mock.mount_sign_out(404).await;

    let session = Authenticator::new(scenario_config(&mock))
        .unwrap()
        .authenticate()
        .await
        .unwrap();
    let err = session.sign_out().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Business);
    assert_eq!(err.status(), Some(404));

    let fresh = Authenticator::new(scenario_config(&mock))
        .unwrap()
        .authenticate()
        .await
        .unwrap();
    assert_eq!(fresh.user().user_name, "integration-app");
    assert_eq!(mock.request_count("POST", "Auth/SignAppIn").await, 2);
}

#[tokio::test]
async fn test_config_from_lookup_drives_a_full_release() {
    init_scenario_tracing();
    let mock = MockPasswordSafe::start().await;
    mock.mount_auth().await;
    mock.mount_sign_out(200).await;
    mock.mount_release("db01", "sa", "300", "p@ss").await;

    let vars = HashMap::from([
        ("PASSWORD_SAFE_API_URL", mock.base_url()),
        ("PASSWORD_SAFE_CLIENT_ID", test_utils::fixtures::CLIENT_ID.to_string()),
        ("PASSWORD_SAFE_CLIENT_SECRET", test_utils::fixtures::CLIENT_SECRET.to_string()),
        ("PASSWORD_SAFE_SEPARATOR", "#".to_string()),
        ("PASSWORD_SAFE_RETRY_MAX_ELAPSED_SECONDS", "1".to_string()),
    ]);
    let config = ClientConfig::from_lookup(|key| vars.get(key).cloned()).unwrap();

    let session = Authenticator::new(config).unwrap().authenticate().await.unwrap();
    let values = ManagedAccountWorkflow::new(&session)
        .get_managed_accounts(&["db01#sa"])
        .await
        .into_result()
        .unwrap();

    assert_eq!(values["db01#sa"].expose_secret(), "p@ss");
    session.sign_out().await.unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    /// Items whose lookup fails are absent; every other item is released.
    #[test]
    fn prop_failed_items_are_isolated(failures in prop::collection::vec(any::<bool>(), 1..6)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let mock = MockPasswordSafe::start().await;
            mock.mount_auth().await;
            mock.mount_request("1").await;
            mock.mount_credential("1", "value").await;
            mock.mount_check_in("1", 204).await;

            let mut paths = Vec::new();
            for (i, fails) in failures.iter().enumerate() {
                let account = format!("acct{i}");
                if *fails {
                    mock.mount_managed_account_error("sys", &account, 404, "not found").await;
                } else {
                    mock.mount_managed_account("sys", &account, 1, 1).await;
                }
                paths.push(format!("sys/{account}"));
            }

            let session = Authenticator::new(scenario_config(&mock))
                .unwrap()
                .authenticate()
                .await
                .unwrap();
            let result = ManagedAccountWorkflow::new(&session)
                .get_managed_accounts(&paths)
                .await;

            let expected_ok = failures.iter().filter(|f| !**f).count();
            prop_assert_eq!(result.len(), expected_ok);
            for (path, fails) in paths.iter().zip(&failures) {
                prop_assert_eq!(result.get(path).is_none(), *fails);
            }
            prop_assert_eq!(result.last_error.is_some(), expected_ok < failures.len());
            prop_assert_eq!(
                mock.request_count("GET", "ManagedAccounts").await,
                failures.len()
            );
            Ok(())
        })?;
    }
}
