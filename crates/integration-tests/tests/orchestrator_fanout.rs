//! Integration tests for orchestrator fan-out: object counts, budgets,
//! naming, targeting and media scoping.

use campaign_launcher::graph::STATUS_PAUSED;
use campaign_launcher::orchestrator::NullSink;
use campaign_launcher::{LaunchPlan, Orchestrator};
use campaign_launcher_core::{
    Budget, CampaignRequest, FanoutStrategy, Gender, MediaRef, RunReport, StoreRegistry,
};
use campaign_launcher_integration_tests::{
    Call, FakePlatform, image, request, settings, video,
};

const LAUNCH_TIMESTAMP: i64 = 1_773_482_400;

async fn run(platform: &FakePlatform, request: &CampaignRequest) -> RunReport {
    let registry = StoreRegistry::builtin();
    let sink = NullSink;
    Orchestrator::new(platform, &registry, &sink)
        .with_settings(settings())
        .run(request)
        .await
        .expect("valid request")
}

// =============================================================================
// Example Scenarios
// =============================================================================

#[tokio::test]
async fn test_abo_single_image() {
    let platform = FakePlatform::new();
    let req = request(FanoutStrategy::Abo, &[1], &["TABO"], vec![image("image1")]);

    let report = run(&platform, &req).await;

    assert!(report.is_success());
    assert_eq!(report.ads_created(), 1);

    let campaigns = platform.campaigns();
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].1.name, "COLOMBIA - LAMPARA - ABO - 13/03");
    assert_eq!(campaigns[0].1.daily_budget, None);

    let ad_sets = platform.ad_sets();
    assert_eq!(ad_sets.len(), 1);
    let ad_set = &ad_sets[0].1;
    assert_eq!(ad_set.name, "COLOMBIA - OPEN");
    assert_eq!(ad_set.daily_budget, Some(Budget::new(40_000).expect("budget")));
    assert_eq!(ad_set.targeting.geo_locations.countries[0].as_str(), "CO");
    assert_eq!(ad_set.start_time, LAUNCH_TIMESTAMP);

    let creatives = platform.creatives();
    assert_eq!(creatives.len(), 1);
    assert_eq!(creatives[0].1.name, "Creative - image1 - LAMPARA");
    assert_eq!(creatives[0].1.link, "https://shop.example.com/lampara");
    let story = creatives[0].1.object_story_spec();
    assert!(story.get("link_data").is_some());
    assert!(story.get("video_data").is_none());

    assert_eq!(platform.ads().len(), 1);
    assert!(
        campaigns[0]
            .1
            .to_form()
            .contains(&("status", STATUS_PAUSED.to_string()))
    );
    assert!(ad_set.to_form().contains(&("status", STATUS_PAUSED.to_string())));
}

#[tokio::test]
async fn test_per_creative_test_image_and_video() {
    let platform = FakePlatform::new();
    let req = request(
        FanoutStrategy::PerCreativeTest,
        &[1],
        &["TABO"],
        vec![image("image1"), video("video1")],
    );

    let report = run(&platform, &req).await;

    assert!(report.is_success());
    assert_eq!(platform.campaigns().len(), 1);
    assert_eq!(platform.campaigns()[0].1.name, "COLOMBIA - LAMPARA - TEST - 13/03");

    let ad_sets = platform.ad_sets();
    assert_eq!(ad_sets.len(), 2);
    for (_, spec) in &ad_sets {
        assert_eq!(spec.daily_budget, Some(Budget::new(40_000).expect("budget")));
    }
    assert_eq!(ad_sets[0].1.name, "COLOMBIA - TEST 1 (image1 - LAMPARA)");
    assert_eq!(ad_sets[1].1.name, "COLOMBIA - TEST 2 (video1 - LAMPARA)");

    let creatives = platform.creatives();
    assert_eq!(creatives.len(), 2);
    assert!(matches!(creatives[0].1.media.media, MediaRef::Image { .. }));
    assert!(matches!(creatives[1].1.media.media, MediaRef::Video { .. }));
    let video_story = creatives[1].1.object_story_spec();
    assert_eq!(
        video_story["video_data"]["image_url"],
        campaign_launcher_integration_tests::fake::THUMBNAIL_URL
    );

    // Each ad binds to its own dedicated ad set
    let ad_set_ids: Vec<_> = platform
        .ads()
        .into_iter()
        .filter_map(|call| match call {
            Call::Ad { ad_set, .. } => Some(ad_set),
            _ => None,
        })
        .collect();
    assert_eq!(ad_set_ids.len(), 2);
    assert_ne!(ad_set_ids[0], ad_set_ids[1]);
}

#[tokio::test]
async fn test_cbo_pools_budget_on_campaign() {
    let platform = FakePlatform::new();
    let req = request(
        FanoutStrategy::Cbo,
        &[1],
        &["ECUADOR"],
        vec![image("a"), image("b")],
    );

    let report = run(&platform, &req).await;

    assert!(report.is_success());
    let campaigns = platform.campaigns();
    assert_eq!(campaigns[0].1.daily_budget, Some(Budget::new(40_000).expect("budget")));
    let ad_sets = platform.ad_sets();
    assert_eq!(ad_sets.len(), 1);
    assert_eq!(ad_sets[0].1.daily_budget, None);
    assert_eq!(ad_sets[0].1.targeting.geo_locations.countries[0].as_str(), "EC");
}

// =============================================================================
// Fan-out Counts
// =============================================================================

#[tokio::test]
async fn test_counts_match_plan_for_every_strategy() {
    for strategy in [
        FanoutStrategy::Abo,
        FanoutStrategy::Cbo,
        FanoutStrategy::PerCreativeTest,
    ] {
        let platform = FakePlatform::new();
        let req = request(
            strategy,
            &[1, 2],
            &["TABO", "ECUADOR", "GUATEMALA"],
            vec![image("a"), video("b"), image("c")],
        );
        let plan = LaunchPlan::for_request(&req);

        let report = run(&platform, &req).await;

        assert!(report.is_success(), "{strategy}");
        assert_eq!(report.units.len(), 6);
        assert_eq!(platform.campaigns().len(), plan.campaigns, "{strategy}");
        assert_eq!(platform.ad_sets().len(), plan.ad_sets, "{strategy}");
        assert_eq!(platform.uploads().len(), plan.uploads, "{strategy}");
        assert_eq!(platform.creatives().len(), plan.creatives, "{strategy}");
        assert_eq!(platform.ads().len(), plan.ads, "{strategy}");

        let expected_ad_sets = if strategy == FanoutStrategy::PerCreativeTest {
            18
        } else {
            6
        };
        assert_eq!(plan.ad_sets, expected_ad_sets);
        assert_eq!(plan.ads, 18);
    }
}

#[tokio::test]
async fn test_units_reported_in_request_order() {
    let platform = FakePlatform::new();
    let req = request(
        FanoutStrategy::Abo,
        &[2, 1],
        &["GUATEMALA", "TABO"],
        vec![image("a")],
    );

    let report = run(&platform, &req).await;

    let order: Vec<(String, String)> = report
        .units
        .iter()
        .map(|u| (u.account_id.to_string(), u.store_key.to_string()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("act_2".to_string(), "GUATEMALA".to_string()),
            ("act_2".to_string(), "TABO".to_string()),
            ("act_1".to_string(), "GUATEMALA".to_string()),
            ("act_1".to_string(), "TABO".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_parallel_accounts_keep_request_order() {
    let platform = FakePlatform::new();
    let req = request(FanoutStrategy::Abo, &[3, 1, 2], &["TABO"], vec![image("a")]);
    let registry = StoreRegistry::builtin();
    let sink = NullSink;
    let mut parallel = settings();
    parallel.max_parallel_accounts = 3;

    let report = Orchestrator::new(&platform, &registry, &sink)
        .with_settings(parallel)
        .run(&req)
        .await
        .expect("valid request");

    let accounts: Vec<String> = report.units.iter().map(|u| u.account_id.to_string()).collect();
    assert_eq!(accounts, vec!["act_3", "act_1", "act_2"]);
    assert_eq!(report.ads_created(), 3);
}

// =============================================================================
// Targeting & Scheduling
// =============================================================================

#[tokio::test]
async fn test_gender_targeting() {
    for (gender, expected) in [
        (Gender::All, None),
        (Gender::Male, Some(vec![1])),
        (Gender::Female, Some(vec![2])),
    ] {
        let platform = FakePlatform::new();
        let mut req = request(FanoutStrategy::Abo, &[1], &["TABO"], vec![image("a")]);
        req.gender = gender;

        run(&platform, &req).await;

        let ad_set = &platform.ad_sets()[0].1;
        assert_eq!(ad_set.targeting.genders, expected);
        let targeting = serde_json::to_value(&ad_set.targeting).expect("json");
        assert_eq!(targeting.get("genders").is_some(), expected.is_some());
        // Launch time does not depend on the audience
        assert_eq!(ad_set.start_time, LAUNCH_TIMESTAMP);
    }
}

#[tokio::test]
async fn test_launch_time_same_for_every_strategy() {
    for strategy in [
        FanoutStrategy::Abo,
        FanoutStrategy::Cbo,
        FanoutStrategy::PerCreativeTest,
    ] {
        let platform = FakePlatform::new();
        let req = request(strategy, &[1], &["TABO"], vec![image("a"), image("b")]);

        run(&platform, &req).await;

        assert!(
            platform
                .ad_sets()
                .iter()
                .all(|(_, spec)| spec.start_time == LAUNCH_TIMESTAMP)
        );
    }
}

// =============================================================================
// Media Scoping
// =============================================================================

#[tokio::test]
async fn test_same_asset_uploaded_per_account() {
    let platform = FakePlatform::new();
    let req = request(FanoutStrategy::Abo, &[1, 2], &["TABO"], vec![image("a")]);

    let report = run(&platform, &req).await;
    assert!(report.is_success());

    let uploads = platform.uploads();
    assert_eq!(uploads.len(), 2);
    for call in &uploads {
        match call {
            Call::Upload { bytes, .. } => assert_eq!(*bytes, Some(7)),
            other => panic!("unexpected call {other:?}"),
        }
    }

    let creatives = platform.creatives();
    assert_eq!(creatives.len(), 2);
    assert_ne!(creatives[0].1.media, creatives[1].1.media);
    for (account, spec) in &creatives {
        assert!(spec.media.belongs_to(account));
    }
}

#[tokio::test]
async fn test_two_stores_same_account_upload_twice() {
    let platform = FakePlatform::new();
    let req = request(
        FanoutStrategy::Abo,
        &[1],
        &["TABO", "LUCENT"],
        vec![video("v")],
    );

    let report = run(&platform, &req).await;

    assert!(report.is_success());
    assert_eq!(platform.uploads().len(), 2);
    let pages: Vec<String> = platform
        .creatives()
        .iter()
        .map(|(_, spec)| spec.page_id.to_string())
        .collect();
    assert_ne!(pages[0], pages[1]);
}
