//! Integration tests for the Graph API client against a local mock server.
//!
//! Exercises wire formats (form fields, multipart uploads, token placement),
//! video polling and error payload classification.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;

use campaign_launcher::config::{GraphConfig, VideoPollPolicy};
use campaign_launcher::graph::{AdSetSpec, CampaignSpec, CreativeSpec, Targeting};
use campaign_launcher::orchestrator::NullSink;
use campaign_launcher::{GraphClient, GraphError, Orchestrator};
use campaign_launcher_core::{
    Budget, CallToAction, CountryCode, CreativeAsset, FanoutStrategy, Gender, MediaKind, MediaRef,
    PageId, PixelId, StoreRegistry,
};
use campaign_launcher_integration_tests::mock::MockGraph;
use campaign_launcher_integration_tests::{account, image, request, settings, video};

const TOKEN: &str = "EAAB-test-token";

fn client(mock: &MockGraph) -> GraphClient {
    let mut config = GraphConfig::new(mock.base_url(), SecretString::from(TOKEN));
    config.video_poll = VideoPollPolicy {
        interval: Duration::from_millis(5),
        max_attempts: 4,
    };
    GraphClient::new(&config).expect("client")
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_list_ad_accounts_skips_malformed_ids() {
    let mock = MockGraph::start().await;

    let accounts = client(&mock).list_ad_accounts().await.expect("accounts");

    assert_eq!(accounts.len(), 2);
    assert_eq!(
        accounts.get("Tienda Principal (COP)").map(ToString::to_string),
        Some("act_111".to_string())
    );
    assert_eq!(
        accounts.get("Respaldo (USD)").map(ToString::to_string),
        Some("act_222".to_string())
    );

    let request = &mock.requests_to("me/adaccounts")[0];
    assert_eq!(request.param("access_token"), Some(TOKEN));
    assert_eq!(request.param("fields"), Some("name,account_id,currency"));
}

#[tokio::test]
async fn test_missing_token_fails_before_any_request() {
    let mock = MockGraph::start().await;
    let mut config = GraphConfig::new(mock.base_url(), SecretString::from("  "));
    assert!(matches!(
        GraphClient::new(&config),
        Err(GraphError::MissingCredential)
    ));

    config.access_token = None;
    assert!(matches!(
        GraphClient::new(&config),
        Err(GraphError::MissingCredential)
    ));
    assert!(mock.requests().is_empty());
}

// =============================================================================
// Media
// =============================================================================

#[tokio::test]
async fn test_image_upload_sends_multipart_file() {
    let mock = MockGraph::start().await;
    let graph = client(&mock);

    let media = graph
        .upload_media(&account(1), &image("hero"))
        .await
        .expect("upload");

    assert!(media.belongs_to(&account(1)));
    assert!(matches!(media.media, MediaRef::Image { ref hash } if hash.as_str().starts_with("hash-act_1-")));

    let upload = &mock.requests_to("act_1/adimages")[0];
    let file = upload.file.as_ref().expect("file part");
    assert_eq!(file.field, "file");
    assert_eq!(file.file_name.as_deref(), Some("hero.jpg"));
    assert_eq!(file.content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(file.len, 7);
    assert_eq!(upload.param("access_token"), Some(TOKEN));
}

#[tokio::test]
async fn test_same_bytes_upload_to_two_accounts() {
    let mock = MockGraph::start().await;
    let graph = client(&mock);
    let asset = image("hero");

    let first = graph.upload_media(&account(1), &asset).await.expect("first");
    let second = graph.upload_media(&account(2), &asset).await.expect("second");

    assert_ne!(first.media, second.media);
    let uploads = mock.requests_to("/adimages");
    assert_eq!(uploads.len(), 2);
    assert!(uploads.iter().all(|u| u.file.as_ref().map(|f| f.len) == Some(7)));
}

#[tokio::test]
async fn test_remote_asset_sends_url() {
    let mock = MockGraph::start().await;
    let asset = CreativeAsset::remote(
        "https://cdn.example.com/hero.jpg",
        MediaKind::Image,
        "Link 1 - LAMPARA",
    );

    client(&mock)
        .upload_media(&account(1), &asset)
        .await
        .expect("upload");

    let upload = &mock.requests_to("act_1/adimages")[0];
    assert!(upload.file.is_none());
    assert_eq!(upload.param("url"), Some("https://cdn.example.com/hero.jpg"));
}

#[tokio::test]
async fn test_video_polled_until_ready() {
    let mock = MockGraph::start().await;
    mock.script_video_statuses(&["processing", "processing", "ready"]);

    let media = client(&mock)
        .upload_media(&account(1), &video("clip"))
        .await
        .expect("video");

    match media.media {
        MediaRef::Video {
            video_id,
            thumbnail_url,
        } => {
            assert_eq!(video_id.as_str(), "video-1");
            assert_eq!(thumbnail_url, "https://cdn.example.com/video-1.jpg");
        }
        MediaRef::Image { .. } => panic!("expected video"),
    }

    let polls = mock.requests_to("video-1");
    assert_eq!(polls.len(), 3);
    assert_eq!(polls[0].param("fields"), Some("status,picture"));
}

#[tokio::test]
async fn test_video_error_state_is_processing_error() {
    let mock = MockGraph::start().await;
    mock.script_video_statuses(&["processing", "error"]);

    let result = client(&mock).upload_media(&account(1), &video("clip")).await;

    assert!(matches!(
        result,
        Err(GraphError::MediaProcessing { ref video_id }) if video_id == "video-1"
    ));
}

#[tokio::test]
async fn test_video_poll_is_bounded() {
    let mock = MockGraph::start().await;
    mock.script_video_statuses(&["processing"; 10]);

    let result = client(&mock).upload_media(&account(1), &video("clip")).await;

    assert!(matches!(
        result,
        Err(GraphError::MediaTimeout { attempts: 4, .. })
    ));
    assert_eq!(mock.requests_to("video-1").len(), 4);
}

// =============================================================================
// Object Creation
// =============================================================================

#[tokio::test]
async fn test_object_creation_wire_format() {
    let mock = MockGraph::start().await;
    let graph = client(&mock);
    let act = account(1);

    let campaign = graph
        .create_campaign(
            &act,
            &CampaignSpec {
                name: "COLOMBIA - LAMPARA - CBO - 13/03".to_string(),
                daily_budget: Some(Budget::new(40_000).expect("budget")),
            },
        )
        .await
        .expect("campaign");
    let ad_set = graph
        .create_ad_set(
            &act,
            &AdSetSpec {
                name: "COLOMBIA - OPEN".to_string(),
                campaign_id: campaign.clone(),
                targeting: Targeting::new(CountryCode::parse("CO").expect("code"), Gender::Female),
                start_time: 1_773_482_400,
                pixel_id: PixelId::new("4560468307512217"),
                daily_budget: None,
            },
        )
        .await
        .expect("ad set");
    let media = graph.upload_media(&act, &image("hero")).await.expect("upload");
    let creative = graph
        .create_ad_creative(
            &act,
            &CreativeSpec {
                name: "Creative - hero".to_string(),
                page_id: PageId::new("243219548872531"),
                media,
                link: "https://shop.example.com".to_string(),
                headline: "Headline".to_string(),
                body: "Body".to_string(),
                call_to_action: CallToAction::ShopNow,
            },
        )
        .await
        .expect("creative");
    graph
        .create_ad(&act, &ad_set, &creative, "hero")
        .await
        .expect("ad");

    let campaign_req = &mock.requests_to("act_1/campaigns")[0];
    assert_eq!(campaign_req.param("status"), Some("PAUSED"));
    assert_eq!(campaign_req.param("objective"), Some("OUTCOME_SALES"));
    assert_eq!(campaign_req.param("daily_budget"), Some("40000"));
    assert_eq!(campaign_req.param("access_token"), Some(TOKEN));

    let ad_set_req = &mock.requests_to("act_1/adsets")[0];
    assert_eq!(ad_set_req.param("campaign_id"), Some(campaign.as_str()));
    assert_eq!(ad_set_req.param("status"), Some("PAUSED"));
    assert_eq!(ad_set_req.param("start_time"), Some("1773482400"));
    assert_eq!(ad_set_req.param("daily_budget"), None);
    let targeting = ad_set_req.json_param("targeting");
    assert_eq!(targeting["geo_locations"]["countries"], json!(["CO"]));
    assert_eq!(targeting["genders"], json!([2]));
    assert_eq!(targeting["age_min"], json!(18));
    assert_eq!(
        ad_set_req.json_param("promoted_object")["pixel_id"],
        json!("4560468307512217")
    );

    let creative_req = &mock.requests_to("act_1/adcreatives")[0];
    let story = creative_req.json_param("object_story_spec");
    assert_eq!(story["page_id"], json!("243219548872531"));
    assert_eq!(story["link_data"]["call_to_action"]["type"], json!("SHOP_NOW"));

    let ad_req = &mock.requests_to("act_1/ads")[0];
    assert_eq!(ad_req.param("adset_id"), Some(ad_set.as_str()));
    assert_eq!(ad_req.param("status"), Some("PAUSED"));
    assert_eq!(
        ad_req.json_param("creative"),
        json!({"creative_id": creative.as_str()})
    );
}

#[tokio::test]
async fn test_creative_rejects_media_from_other_account() {
    let mock = MockGraph::start().await;
    let graph = client(&mock);
    let media = graph.upload_media(&account(1), &image("hero")).await.expect("upload");

    let result = graph
        .create_ad_creative(
            &account(2),
            &CreativeSpec {
                name: "Creative - hero".to_string(),
                page_id: PageId::new("1"),
                media,
                link: "https://shop.example.com".to_string(),
                headline: "H".to_string(),
                body: "B".to_string(),
                call_to_action: CallToAction::OrderNow,
            },
        )
        .await;

    assert!(matches!(result, Err(GraphError::MediaScopeMismatch { .. })));
    assert!(mock.requests_to("adcreatives").is_empty());
}

// =============================================================================
// Error Payloads
// =============================================================================

async fn campaign_error(status: u16, body: serde_json::Value) -> GraphError {
    let mock = MockGraph::start().await;
    mock.fail_edge("campaigns", status, body);
    client(&mock)
        .create_campaign(
            &account(1),
            &CampaignSpec {
                name: "X".to_string(),
                daily_budget: None,
            },
        )
        .await
        .expect_err("scripted failure")
}

#[tokio::test]
async fn test_error_payload_classification() {
    let err = campaign_error(
        400,
        json!({"error": {"message": "Invalid parameter", "code": 100, "type": "OAuthException"}}),
    )
    .await;
    assert!(matches!(err, GraphError::Api { code: 100, ref message } if message == "Invalid parameter"));

    let err = campaign_error(
        400,
        json!({"error": {"message": "Session has expired", "code": 190}}),
    )
    .await;
    assert!(matches!(err, GraphError::InvalidToken(ref m) if m == "Session has expired"));

    let err = campaign_error(
        400,
        json!({"error": {"message": "User request limit reached", "code": 17}}),
    )
    .await;
    assert!(matches!(err, GraphError::RateLimited { code: 17, .. }));

    // Error payload on a 200 still counts as an error
    let err = campaign_error(200, json!({"error": {"message": "Nope", "code": 1}})).await;
    assert!(matches!(err, GraphError::Api { code: 1, .. }));

    let err = campaign_error(200, json!({"success": true})).await;
    assert!(matches!(err, GraphError::MissingId { object: "campaign" }));
}

// =============================================================================
// Orchestrator Over HTTP
// =============================================================================

#[tokio::test]
async fn test_orchestrator_against_mock_graph() {
    let mock = MockGraph::start().await;
    mock.fail_edge(
        "adcreatives",
        400,
        json!({"error": {"message": "Invalid page", "code": 100}}),
    );
    let graph = client(&mock);
    let registry = StoreRegistry::builtin();
    let sink = NullSink;
    let req = request(FanoutStrategy::PerCreativeTest, &[1], &["TABO"], vec![image("a")]);

    let report = Orchestrator::new(&graph, &registry, &sink)
        .with_settings(settings())
        .run(&req)
        .await
        .expect("valid request");

    let unit = &report.units[0];
    let reason = unit.outcome.reason().expect("failed");
    assert!(reason.contains("API error 100: Invalid page"));
    assert_eq!(mock.requests_to("/campaigns").len(), 1);
    assert_eq!(mock.requests_to("/adsets").len(), 1);
    assert!(mock.requests_to("/ads").is_empty());

    assert_eq!(
        mock.requests_to("/adsets")[0].param("campaign_id"),
        Some("campaigns-1")
    );
    // Image upload came after the campaign but before the dedicated ad set
    let order: Vec<String> = mock.requests().iter().map(|r| r.path.clone()).collect();
    assert_eq!(
        order,
        vec!["act_1/campaigns", "act_1/adimages", "act_1/adsets", "act_1/adcreatives"]
    );
}
