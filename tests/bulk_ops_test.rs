mod common;

use actix_web::{http::StatusCode, test};
use blogbench::database::models::post;
use sea_orm::{EntityTrait, PaginatorTrait};

// Every bulk scenario runs under both strategies: the legacy load-then-filter
// path and the set-based SQL path selected by the bulk_ops flag.

async fn archive_rewrites_old_posts(bulk_ops: bool) {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "chronicles", false).await;
    let old = common::seed_post(&db, blog.id, "Old Post", 2015).await;
    let fresh = common::seed_post(&db, blog.id, "Fresh Post", 2021).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=chronicles&priorToYear=2018")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1);

    let archived = post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(archived.archived);
    assert_eq!(archived.title, "Old Post (2015)");
    assert_eq!(
        archived.banner.as_deref(),
        Some("This post was published in 2015 and has been archived.")
    );

    let untouched = post::Entity::find_by_id(fresh.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.archived);
    assert_eq!(untouched.title, "Fresh Post");
    assert!(untouched.banner.is_none());
}

#[actix_web::test]
async fn archive_rewrites_old_posts_load_then_filter() {
    archive_rewrites_old_posts(false).await;
}

#[actix_web::test]
async fn archive_rewrites_old_posts_set_based() {
    archive_rewrites_old_posts(true).await;
}

async fn archive_skips_premium_accounts(bulk_ops: bool) {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "vip", true).await;
    let old = common::seed_post(&db, blog.id, "Premium Post", 2012).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=vip&priorToYear=2018")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 0);

    let untouched = post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.archived);
    assert_eq!(untouched.title, "Premium Post");
}

#[actix_web::test]
async fn archive_skips_premium_accounts_load_then_filter() {
    archive_skips_premium_accounts(false).await;
}

#[actix_web::test]
async fn archive_skips_premium_accounts_set_based() {
    archive_skips_premium_accounts(true).await;
}

async fn archive_applies_exactly_once(bulk_ops: bool) {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "chronicles", false).await;
    let old = common::seed_post(&db, blog.id, "Old Post", 2015).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    for expected in [1, 0] {
        let req = test::TestRequest::put()
            .uri("/api/posts/archive?blogName=chronicles&priorToYear=2018")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["rowsAffected"], expected);
    }

    let archived = post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    // The already-archived predicate keeps the rewrite from stacking.
    assert_eq!(archived.title, "Old Post (2015)");
}

#[actix_web::test]
async fn archive_applies_exactly_once_load_then_filter() {
    archive_applies_exactly_once(false).await;
}

#[actix_web::test]
async fn archive_applies_exactly_once_set_based() {
    archive_applies_exactly_once(true).await;
}

async fn archive_leaves_other_blogs_alone(bulk_ops: bool) {
    let db = common::setup_db().await;
    let alpha = common::seed_blog(&db, "alpha", false).await;
    let beta = common::seed_blog(&db, "beta", false).await;
    common::seed_post(&db, alpha.id, "Alpha Post", 2010).await;
    let other = common::seed_post(&db, beta.id, "Beta Post", 2010).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=alpha&priorToYear=2018")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1);

    let untouched = post::Entity::find_by_id(other.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.archived);
}

#[actix_web::test]
async fn archive_leaves_other_blogs_alone_load_then_filter() {
    archive_leaves_other_blogs_alone(false).await;
}

#[actix_web::test]
async fn archive_leaves_other_blogs_alone_set_based() {
    archive_leaves_other_blogs_alone(true).await;
}

async fn delete_removes_only_matching_posts(bulk_ops: bool) {
    let db = common::setup_db().await;
    let purge = common::seed_blog(&db, "purge", false).await;
    let vip = common::seed_blog(&db, "vip", true).await;
    let old = common::seed_post(&db, purge.id, "Old Post", 2010).await;
    let fresh = common::seed_post(&db, purge.id, "Fresh Post", 2021).await;
    let premium = common::seed_post(&db, vip.id, "Premium Post", 2010).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    let req = test::TestRequest::delete()
        .uri("/api/posts/delete?blogName=purge&priorToYear=2015")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1);

    assert!(post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .is_none());
    assert!(post::Entity::find_by_id(fresh.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
    assert!(post::Entity::find_by_id(premium.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[actix_web::test]
async fn delete_removes_only_matching_posts_load_then_filter() {
    delete_removes_only_matching_posts(false).await;
}

#[actix_web::test]
async fn delete_removes_only_matching_posts_set_based() {
    delete_removes_only_matching_posts(true).await;
}

async fn archive_formats_early_years_without_padding(bulk_ops: bool) {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "medieval", false).await;
    let ancient = common::seed_post(&db, blog.id, "Ancient Post", 800).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, bulk_ops)))
            .await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=medieval&priorToYear=2018")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let archived = post::Entity::find_by_id(ancient.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    // The stored timestamp text zero-pads the year; the rewritten title and
    // banner must not.
    assert_eq!(archived.title, "Ancient Post (800)");
    assert_eq!(
        archived.banner.as_deref(),
        Some("This post was published in 800 and has been archived.")
    );
}

#[actix_web::test]
async fn archive_formats_early_years_without_padding_load_then_filter() {
    archive_formats_early_years_without_padding(false).await;
}

#[actix_web::test]
async fn archive_formats_early_years_without_padding_set_based() {
    archive_formats_early_years_without_padding(true).await;
}

#[actix_web::test]
async fn archive_rolls_back_when_benchmarking() {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "chronicles", false).await;
    let old = common::seed_post(&db, blog.id, "Old Post", 2015).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), true, false))).await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=chronicles&priorToYear=2018")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    // The write path runs in full before the rollback, so the count is real.
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1);

    let untouched = post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert!(!untouched.archived);
    assert_eq!(untouched.title, "Old Post");
    assert!(untouched.banner.is_none());
}

#[actix_web::test]
async fn delete_rolls_back_when_benchmarking() {
    let db = common::setup_db().await;
    let blog = common::seed_blog(&db, "purge", false).await;
    let old = common::seed_post(&db, blog.id, "Old Post", 2010).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), true, false))).await;

    let req = test::TestRequest::delete()
        .uri("/api/posts/delete?blogName=purge&priorToYear=2015")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1);

    assert!(post::Entity::find_by_id(old.id)
        .one(&db)
        .await
        .unwrap()
        .is_some());
}

#[actix_web::test]
async fn archive_rejects_out_of_range_year() {
    let db = common::setup_db().await;
    let app = test::init_service(common::build_app(common::test_state(db, false, false))).await;

    let req = test::TestRequest::put()
        .uri("/api/posts/archive?blogName=chronicles&priorToYear=0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[actix_web::test]
async fn bulk_insert_adds_exactly_one_thousand_posts() {
    let db = common::setup_db().await;
    // First blog in a fresh database gets id 1, the synthetic batch target.
    common::seed_blog(&db, "benchmark", false).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), false, false))).await;

    let req = test::TestRequest::post().uri("/api/posts/insert").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["rowsAffected"], 1000);

    let count = post::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 1000);
}

#[actix_web::test]
async fn bulk_insert_rolls_back_when_benchmarking() {
    let db = common::setup_db().await;
    common::seed_blog(&db, "benchmark", false).await;
    let app =
        test::init_service(common::build_app(common::test_state(db.clone(), true, false))).await;

    let req = test::TestRequest::post().uri("/api/posts/insert").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let count = post::Entity::find().count(&db).await.unwrap();
    assert_eq!(count, 0);
}
