//! 端到端流程测试：任务平台和验证码服务都用 wiremock 模拟

use serde_json::json;
use std::path::Path;
use tokio_test::{assert_err, assert_ok};
use waitlist_task_runner::clients::CaptchaClient;
use waitlist_task_runner::infrastructure::build_direct_client;
use waitlist_task_runner::services::{QuotaStore, SolverSettings};
use waitlist_task_runner::utils::logging;
use waitlist_task_runner::{
    AccessCredential, App, CaptchaSolver, ChallengeContext, Config, ProgressStore, TaskId,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(dir: &Path, waitlist: &MockServer, captcha: &MockServer) -> Config {
    Config {
        waitlist_api_base_url: waitlist.uri(),
        captcha_api_base_url: captcha.uri(),
        captcha_api_key: "test-key".to_string(),
        captcha_website_url: "https://waitlist.example/".to_string(),
        captcha_website_key: "site-key".to_string(),
        max_captcha_daily: 10,
        quota_file: dir.join("captcha_count_cache.json").display().to_string(),
        progress_file: dir.join("completed_tasks.json").display().to_string(),
        captcha_poll_interval_ms: 0,
        task_delay_ms: 0,
        account_delay_ms: 0,
        http_timeout_secs: 5,
        check_in_enabled: false,
        ..Config::default()
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn mount_profile(server: &MockServer, token: &str, email: &str) {
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": email,
            "nickname": "tester"
        })))
        .mount(server)
        .await;
}

async fn mount_tasks(server: &MockServer, tasks: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/waitlist/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(tasks))
        .mount(server)
        .await;
}

async fn mount_captcha_ready(server: &MockServer, token: &str, expected_solves: u64) {
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .and(body_partial_json(json!({
            "clientKey": "test-key",
            "task": {"websiteURL": "https://waitlist.example/", "websiteKey": "site-key"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "taskId": 777})))
        .expect(expected_solves)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .and(body_partial_json(json!({"taskId": 777})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 0,
            "status": "ready",
            "solution": {"token": token}
        })))
        .mount(server)
        .await;
}

async fn mount_complete(server: &MockServer, task_id: &str, recaptcha: &str, expected: u64) {
    Mock::given(method("PATCH"))
        .and(path(format!("/waitlist/tasks/{}", task_id)))
        .and(header("Recaptcha", recaptcha))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "title": format!("task {}", task_id),
            "status": "completed"
        })))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_solved_task_is_completed_and_recorded() {
    logging::init(false);
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 42, "title": "Follow", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 1).await;
    mount_complete(&waitlist, "42", "abc123", 1).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let stats = assert_ok!(app.run_sweep().await);
    assert_eq!(stats.accounts_ok, 1);
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.tasks_failed, 0);

    assert!(app.progress()["a@example.com"].is_completed(&TaskId::new("42")));
    assert_eq!(app.solver().quota().count_for(today()), 1);

    // 进度和额度都已落盘
    let saved = ProgressStore::new(dir.path().join("completed_tasks.json")).load().await;
    assert!(saved["a@example.com"].is_completed(&TaskId::new("42")));
    let quota = QuotaStore::new(dir.path().join("captcha_count_cache.json")).load().await;
    assert_eq!(quota.count_for(today()), 1);
}

#[tokio::test]
async fn test_children_completed_individually_parent_never_submitted() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(
        &waitlist,
        json!([{
            "id": 10, "title": "Social", "status": "new",
            "child": [
                {"id": 11, "title": "X", "status": "new"},
                {"id": 12, "title": "Discord", "status": "new"}
            ]
        }]),
    )
    .await;
    mount_captcha_ready(&captcha, "tok-abc", 2).await;
    mount_complete(&waitlist, "11", "tok-abc", 1).await;
    mount_complete(&waitlist, "12", "tok-abc", 1).await;
    mount_complete(&waitlist, "10", "tok-abc", 0).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let stats = assert_ok!(app.run_sweep().await);
    assert_eq!(stats.tasks_completed, 2);

    let record = &app.progress()["a@example.com"];
    assert!(record.is_completed(&TaskId::new("11")));
    assert!(record.is_completed(&TaskId::new("12")));
    assert!(!record.is_completed(&TaskId::new("10")));
}

#[tokio::test]
async fn test_recorded_task_is_never_resubmitted() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    // 服务端仍然报告 new，但本地已记录
    mount_tasks(&waitlist, json!([{"id": "t-1", "title": "Quiz", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 1).await;
    mount_complete(&waitlist, "t-1", "abc123", 1).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(config.clone(), vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    assert_eq!(assert_ok!(app.run_sweep().await).tasks_completed, 1);
    assert_eq!(assert_ok!(app.run_sweep().await).tasks_completed, 0);

    // 重启后从磁盘恢复，同样不会再提交
    let mut restarted = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();
    assert_eq!(assert_ok!(restarted.run_sweep().await).tasks_completed, 0);
}

#[tokio::test]
async fn test_poll_exhaustion_is_recoverable_without_quota_increment() {
    let dir = tempfile::tempdir().unwrap();
    let captcha = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "taskId": 5})))
        .expect(1)
        .mount(&captcha)
        .await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "status": "processing"})))
        .expect(3)
        .mount(&captcha)
        .await;

    let http = build_direct_client(std::time::Duration::from_secs(5)).unwrap();
    let client = CaptchaClient::new(http, &captcha.uri(), "test-key");
    let quota_store = QuotaStore::new(dir.path().join("quota.json"));
    let settings = SolverSettings {
        daily_limit: 10,
        poll_interval: std::time::Duration::ZERO,
        max_polls: 3,
    };
    let mut solver = CaptchaSolver::new(client, quota_store, settings).await;
    let challenge = ChallengeContext {
        website_url: "https://waitlist.example/".to_string(),
        website_key: "site-key".to_string(),
    };

    let err = assert_err!(solver.solve_on(today(), &challenge, None).await);
    assert!(!err.is_fatal());
    assert_eq!(solver.quota().count_for(today()), 0);
    assert!(!dir.path().join("quota.json").exists());
}

#[tokio::test]
async fn test_job_error_stops_polling_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let captcha = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "taskId": 6})))
        .expect(1)
        .mount(&captcha)
        .await;
    Mock::given(method("POST"))
        .and(path("/getTaskResult"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"errorId": 0, "status": "error"})))
        .expect(1)
        .mount(&captcha)
        .await;

    let http = build_direct_client(std::time::Duration::from_secs(5)).unwrap();
    let client = CaptchaClient::new(http, &captcha.uri(), "test-key");
    let settings = SolverSettings {
        daily_limit: 10,
        poll_interval: std::time::Duration::ZERO,
        max_polls: 3,
    };
    let mut solver = CaptchaSolver::new(client, QuotaStore::new(dir.path().join("quota.json")), settings).await;
    let challenge = ChallengeContext {
        website_url: "https://waitlist.example/".to_string(),
        website_key: "site-key".to_string(),
    };

    let err = assert_err!(solver.solve_on(today(), &challenge, None).await);
    assert!(!err.is_fatal());
    assert_eq!(solver.quota().count_for(today()), 0);
    assert!(!dir.path().join("quota.json").exists());
}

#[tokio::test]
async fn test_quota_at_limit_stops_before_create_task() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    std::fs::write(
        dir.path().join("captcha_count_cache.json"),
        json!({ today().to_string(): 10 }).to_string(),
    )
    .unwrap();

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_profile(&waitlist, "tok-2", "b@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 1, "title": "Follow", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 0).await;
    mount_complete(&waitlist, "1", "abc123", 0).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(
        config,
        vec![AccessCredential::new("tok-1"), AccessCredential::new("tok-2")],
        vec![],
    )
    .await
    .unwrap();

    let err = assert_err!(app.run_sweep().await);
    assert!(err.is_fatal());

    // 退出前已保存进度，第二个账号没有被处理
    assert!(dir.path().join("completed_tasks.json").exists());
    assert!(app.progress().contains_key("a@example.com"));
    assert!(!app.progress().contains_key("b@example.com"));
}

#[tokio::test]
async fn test_missing_api_key_is_fatal_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 1, "title": "Follow", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 0).await;

    let config = Config {
        captcha_api_key: "  ".to_string(),
        ..test_config(dir.path(), &waitlist, &captcha)
    };
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let err = assert_err!(app.run_sweep().await);
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_two_accounts_without_proxies_processed_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_profile(&waitlist, "tok-2", "b@example.com").await;
    mount_tasks(&waitlist, json!([])).await;

    let config = Config {
        account_delay_ms: 20,
        ..test_config(dir.path(), &waitlist, &captcha)
    };
    let mut app = App::with_inputs(
        config,
        vec![AccessCredential::new("tok-1"), AccessCredential::new("tok-2")],
        vec![],
    )
    .await
    .unwrap();

    assert!(app.assign_proxy(0).is_none());
    assert!(app.assign_proxy(1).is_none());

    let started = std::time::Instant::now();
    let stats = assert_ok!(app.run_sweep().await);
    assert!(started.elapsed() >= std::time::Duration::from_millis(40));
    assert_eq!(stats.accounts_total, 2);
    assert_eq!(stats.accounts_ok, 2);

    let requests = waitlist.received_requests().await.unwrap();
    let auth: Vec<String> = requests
        .iter()
        .filter(|r| r.url.path() == "/user/profile")
        .filter_map(|r| r.headers.get("authorization"))
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(auth, vec!["Bearer tok-1", "Bearer tok-2"]);
}

#[tokio::test]
async fn test_proxies_assigned_round_robin() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let credentials = (1..=3).map(|i| AccessCredential::new(format!("tok-{}", i))).collect();
    let proxies = vec!["10.0.0.1:8080".to_string(), "not a proxy".to_string()];
    let app = App::with_inputs(config, credentials, proxies).await.unwrap();

    assert_eq!(app.assign_proxy(0).map(|p| p.host), Some("10.0.0.1".to_string()));
    assert!(app.assign_proxy(1).is_none());
    assert_eq!(app.assign_proxy(2).map(|p| p.port), Some(8080));
}

#[tokio::test]
async fn test_profile_failure_skips_only_that_account() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("Authorization", "Bearer bad"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized"})))
        .mount(&waitlist)
        .await;
    mount_profile(&waitlist, "good", "g@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 3, "title": "Follow", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 1).await;
    mount_complete(&waitlist, "3", "abc123", 1).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(
        config,
        vec![AccessCredential::new("bad"), AccessCredential::new("good")],
        vec![],
    )
    .await
    .unwrap();

    let stats = assert_ok!(app.run_sweep().await);
    assert_eq!(stats.accounts_ok, 1);
    assert_eq!(stats.tasks_completed, 1);
    assert!(app.progress()["g@example.com"].is_completed(&TaskId::new("3")));
}

#[tokio::test]
async fn test_completion_failure_leaves_task_pending() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(
        &waitlist,
        json!([
            {"id": 1, "title": "Broken", "status": "new"},
            {"id": 2, "title": "Works", "status": "new"}
        ]),
    )
    .await;
    mount_captcha_ready(&captcha, "abc123", 2).await;
    Mock::given(method("PATCH"))
        .and(path("/waitlist/tasks/1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid recaptcha"})))
        .expect(1)
        .mount(&waitlist)
        .await;
    mount_complete(&waitlist, "2", "abc123", 1).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let stats = assert_ok!(app.run_sweep().await);
    assert_eq!(stats.tasks_completed, 1);
    assert_eq!(stats.tasks_failed, 1);

    let record = &app.progress()["a@example.com"];
    assert!(!record.is_completed(&TaskId::new("1")));
    assert!(record.is_completed(&TaskId::new("2")));
}

#[tokio::test]
async fn test_create_task_error_skips_task() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 1, "title": "Follow", "status": "new"}])).await;
    Mock::given(method("POST"))
        .and(path("/createTask"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errorId": 1,
            "errorCode": "ERROR_ZERO_BALANCE"
        })))
        .expect(1)
        .mount(&captcha)
        .await;
    mount_complete(&waitlist, "1", "abc123", 0).await;

    let config = test_config(dir.path(), &waitlist, &captcha);
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let stats = assert_ok!(app.run_sweep().await);
    assert_eq!(stats.tasks_failed, 1);
    assert_eq!(app.solver().quota().count_for(today()), 0);
}

#[tokio::test]
async fn test_daily_check_in_once_per_day() {
    let dir = tempfile::tempdir().unwrap();
    let waitlist = MockServer::start().await;
    let captcha = MockServer::start().await;

    mount_profile(&waitlist, "tok-1", "a@example.com").await;
    mount_tasks(&waitlist, json!([{"id": 99, "title": "Daily check-in", "status": "new"}])).await;
    mount_captcha_ready(&captcha, "abc123", 1).await;
    mount_complete(&waitlist, "99", "abc123", 1).await;

    let config = Config {
        check_in_enabled: true,
        ..test_config(dir.path(), &waitlist, &captcha)
    };
    let mut app = App::with_inputs(config, vec![AccessCredential::new("tok-1")], vec![])
        .await
        .unwrap();

    let first = assert_ok!(app.run_sweep().await);
    assert_eq!(first.check_ins, 1);
    let second = assert_ok!(app.run_sweep().await);
    assert_eq!(second.check_ins, 0);

    let record = &app.progress()["a@example.com"];
    assert!(record.has_checked_in(today()));
    assert!(!record.is_completed(&TaskId::new("99")));
}
