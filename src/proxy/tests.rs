use super::*;
use crate::errors::Error;
use crate::token::mock::MockToken;
use mockito::Matcher;
use serde_json::json;

fn proxy_with(token: Arc<MockToken>, callback_url: &str) -> TokenProxy {
    TokenProxy::new(token, callback_url, None).unwrap()
}

// 配送されない宛先（失敗はログのみ）
const NOWHERE: &str = "http://127.0.0.1:9/cb";

async fn wait_matched(mock: &mockito::Mock) {
    for _ in 0..200 {
        if mock.matched_async().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[test]
fn test_new_rejects_invalid_callback_url() {
    let token = Arc::new(MockToken::default());
    let res = TokenProxy::new(token, "", None);
    assert!(matches!(res, Err(Error::InvalidCallbackUrl(_))));
}

#[tokio::test]
async fn test_reads_are_passed_through() {
    let proxy = proxy_with(Arc::new(MockToken::default()), NOWHERE);

    assert_eq!(proxy.reserve().as_deref(), Some("0xreserve"));
    assert_eq!(proxy.name().await.unwrap(), "Gold");
    assert_eq!(proxy.symbol().await.unwrap(), "GLD");
    assert_eq!(proxy.decimals().await.unwrap(), 18);
    assert_eq!(proxy.total_supply().await.unwrap(), "1000000");
    assert_eq!(proxy.balance_of("0xA").await.unwrap(), "1.5");
    assert_eq!(proxy.allowance("0xA", "0xB").await.unwrap(), "0.25");
}

#[tokio::test]
async fn test_missing_owner_is_passed_to_token() {
    let token = Arc::new(MockToken::default());
    let proxy = proxy_with(token.clone(), NOWHERE);

    let res = proxy.balance_of("").await;
    assert!(matches!(res, Err(Error::Contract(_))));
    assert_eq!(token.calls(), ["balanceOf()"]);
}

#[tokio::test]
async fn test_invalid_amount_never_reaches_token() {
    let token = Arc::new(MockToken::default());
    let proxy = proxy_with(token.clone(), NOWHERE);

    for value in ["", "abc", "NaN", "Infinity", "-1"] {
        let res = proxy.transfer("0xA", "0xB", value, None).await;
        assert!(matches!(res, Err(Error::InvalidAmount(_))), "{value:?}");
        let res = proxy.transfer_from("0xS", "0xA", "0xB", value, None).await;
        assert!(matches!(res, Err(Error::InvalidAmount(_))), "{value:?}");
        let res = proxy.approve("0xA", "0xB", value, None).await;
        assert!(matches!(res, Err(Error::InvalidAmount(_))), "{value:?}");
    }

    assert!(token.calls().is_empty());
    assert!(proxy.log("0xA").is_empty());
    assert!(proxy.log("0xB").is_empty());
}

#[tokio::test]
async fn test_transfer_records_and_notifies() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cb")
        .match_body(Matcher::PartialJson(json!({
            "from": "0xA",
            "to": "0xB",
            "value": "1500000000000000000",
            "tag": "payout",
            "txid": "0x0000",
            "symbol": "GLD",
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let token = Arc::new(MockToken::default());
    let proxy = proxy_with(token.clone(), &format!("{}/cb", server.url()));

    let txid = proxy
        .transfer("0xA", "0xB", "1.5", Some("payout"))
        .await
        .unwrap();
    assert_eq!(txid, "0x0000");
    assert_eq!(token.calls(), ["transfer(0xA,0xB,1500000000000000000)"]);

    for owner in ["0xA", "0xB"] {
        let entries = proxy.log(owner);
        assert_eq!(entries.len(), 1, "{owner}");
        let entry = &entries[0];
        assert_eq!(entry.from, "0xA");
        assert_eq!(entry.to, "0xB");
        assert_eq!(entry.amount, Wei::of(1_500_000_000_000_000_000));
        assert_eq!(entry.tag, "payout");
        assert_eq!(entry.transaction_id, "0x0000");
        assert_eq!(entry.symbol.as_deref(), Some("GLD"));
    }

    wait_matched(&mock).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_transfer_returns_handle_txid() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cb")
        .match_body(Matcher::PartialJson(json!({
            "from": "A",
            "to": "B",
            "value": "10000000000000000000",
            "tag": "transfer",
            "txid": "0xdeadbeef",
        })))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let token = Arc::new(MockToken::with_txid("0xdeadbeef"));
    let proxy = proxy_with(token, &format!("{}/cb", server.url()));

    let txid = proxy.transfer("A", "B", "10", None).await.unwrap();
    assert_eq!(txid, "0xdeadbeef");
    for owner in ["A", "B"] {
        let entries = proxy.log(owner);
        assert_eq!(entries.len(), 1, "{owner}");
        assert_eq!(entries[0].amount, Wei::of(10 * 10_u128.pow(18)));
        assert_eq!(entries[0].transaction_id, "0xdeadbeef");
    }

    wait_matched(&mock).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_default_tags_and_keys() {
    let token = Arc::new(MockToken::default());
    let proxy = proxy_with(token.clone(), NOWHERE);

    proxy.transfer("0xA", "0xB", "0", Some("")).await.unwrap();
    proxy
        .transfer_from("0xS", "0xC", "0xD", "0", None)
        .await
        .unwrap();
    proxy.approve("0xE", "0xF", "0", None).await.unwrap();

    assert_eq!(proxy.log("0xA")[0].tag, "transfer");
    assert_eq!(proxy.log("0xB")[0].tag, "transfer");

    // transferFrom は from/to に記録し、sender には記録しない
    assert!(proxy.log("0xS").is_empty());
    assert_eq!(proxy.log("0xC")[0].tag, "transferFrom");
    assert_eq!(proxy.log("0xD")[0].from, "0xC");

    assert_eq!(proxy.log("0xE")[0].tag, "approve");
    assert_eq!(proxy.log("0xF")[0].to, "0xF");
}

#[tokio::test]
async fn test_contract_failure_is_not_recorded() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cb")
        .expect(0)
        .create_async()
        .await;

    let token = Arc::new(MockToken::failing());
    let proxy = proxy_with(token.clone(), &format!("{}/cb", server.url()));

    let res = proxy.transfer("0xA", "0xB", "10", None).await;
    assert!(matches!(res, Err(Error::Contract(_))));
    assert_eq!(token.calls().len(), 1);
    assert!(proxy.log("0xA").is_empty());

    tokio::time::sleep(Duration::from_millis(50)).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_callback_failure_does_not_affect_result() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/cb")
        .with_status(500)
        .expect(1)
        .create_async()
        .await;

    let proxy = proxy_with(
        Arc::new(MockToken::default()),
        &format!("{}/cb", server.url()),
    );

    let txid = proxy.approve("0xA", "0xB", "2", None).await.unwrap();
    assert_eq!(txid, "0x0000");
    assert_eq!(proxy.log("0xA").len(), 1);

    // 失敗してもリトライしない
    wait_matched(&mock).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    mock.assert_async().await;
}

#[tokio::test]
async fn test_symbol_failure_leaves_symbol_empty() {
    let token = Arc::new(MockToken::without_symbol());
    let proxy = proxy_with(token, NOWHERE);

    assert!(proxy.warm_up().await.is_err());
    proxy.transfer("0xA", "0xB", "1", None).await.unwrap();
    assert_eq!(proxy.log("0xA")[0].symbol, None);
}

#[tokio::test]
async fn test_log_order_follows_completion() {
    let token = Arc::new(MockToken::default());
    let proxy = proxy_with(token, NOWHERE);
    proxy.warm_up().await.unwrap();

    // 金額が大きいほど完了が遅い
    let (slow, fast, medium) = tokio::join!(
        proxy.transfer("0xA", "0xB", "5", Some("slow")),
        proxy.transfer("0xA", "0xC", "1", Some("fast")),
        proxy.transfer("0xD", "0xA", "3", Some("medium")),
    );
    slow.unwrap();
    fast.unwrap();
    medium.unwrap();

    let tags: Vec<_> = proxy.log("0xA").into_iter().map(|e| e.tag).collect();
    assert_eq!(tags, ["fast", "medium", "slow"]);
}
