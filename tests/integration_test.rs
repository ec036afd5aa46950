//! End-to-end checks over real sockets against local scripted servers.

mod helpers;

use std::time::{Duration, Instant};

use chrono::Utc;

use helpers::{closed_port, redirect, spawn_server, spawn_silent_server, NO_CONTENT, OK};
use portal_login::initialization::init_transport;
use portal_login::{run_once, Config, PortalMonitor, TickOutcome};

fn config_for(probe_urls: &[String], send_to: &str, extra: &str) -> Config {
    let urls = probe_urls
        .iter()
        .map(|url| format!("\"{url}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let text = format!(
        r#"{{
            "urls_to_check": [{urls}],
            "detect_redirect_to": "/portal/",
            "destination": {{ "send_to": "{send_to}", "data": "user=me&pass=pw" }}
            {extra}
        }}"#
    );
    Config::from_json_str(&text).expect("test config is valid")
}

#[tokio::test]
async fn test_portal_login_over_sockets() {
    let server = spawn_server(|port| {
        vec![
            (
                "/generate_204",
                vec![
                    redirect(&format!("http://127.0.0.1:{port}/portal/start")),
                    NO_CONTENT.to_string(),
                ],
            ),
            (
                "/portal/start",
                vec!["HTTP/1.1 302 Found\r\nSet-Cookie: session=xyz; Path=/\r\nLocation: /portal/form\r\n\r\n"
                    .to_string()],
            ),
            ("/portal/form", vec![OK.to_string()]),
            ("/portal/login", vec![OK.to_string()]),
        ]
    })
    .await;

    let config = config_for(
        &[server.url("/generate_204")],
        &server.url("/portal/login"),
        "",
    );
    let transport = init_transport(&config).expect("transport");
    let mut monitor = PortalMonitor::new(config, transport);

    let outcome = monitor.tick_at(Utc::now()).await;

    assert_eq!(outcome, TickOutcome::Exhausted);
    let counts = monitor.report().counts();
    assert_eq!(counts.login_attempts, 1);
    assert_eq!(counts.successful_logins, 1);
    assert_eq!(counts.failed_connections, 0);

    let form = server.requests_to("/portal/form");
    assert_eq!(form.len(), 1);
    assert!(form[0].contains("Cookie: session=xyz\r\n"));

    let login = server.requests_to("/portal/login");
    assert_eq!(login.len(), 1);
    assert!(login[0].starts_with("POST /portal/login HTTP/1.1\r\n"));
    assert!(login[0].contains(&format!("Host: 127.0.0.1:{}\r\n", server.port)));
    assert!(login[0].contains("Content-Type: application/x-www-form-urlencoded\r\n"));
    assert!(login[0].contains("Cookie: session=xyz\r\n"));
    assert!(login[0].ends_with("\r\n\r\nuser=me&pass=pw"));

    assert_eq!(server.requests_to("/generate_204").len(), 2);
}

#[tokio::test]
async fn test_refused_connection_falls_through_to_next_server() {
    let dead = closed_port().await;
    let server = spawn_server(|_| vec![("/", vec![NO_CONTENT.to_string()])]).await;

    let config = config_for(
        &[format!("http://127.0.0.1:{dead}/"), server.url("/")],
        &server.url("/portal/login"),
        "",
    );
    let transport = init_transport(&config).expect("transport");
    let mut monitor = PortalMonitor::new(config, transport);

    let outcome = monitor.tick_at(Utc::now()).await;

    assert_eq!(
        outcome,
        TickOutcome::Connected {
            host: "127.0.0.1".to_string()
        }
    );
    assert_eq!(monitor.report().counts().failed_connections, 1);
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let port = spawn_silent_server().await;

    let config = config_for(
        &[format!("http://127.0.0.1:{port}/")],
        "http://127.0.0.1/portal/login",
        r#", "socket_timeout_ms": 200"#,
    );
    let transport = init_transport(&config).expect("transport");
    let mut monitor = PortalMonitor::new(config, transport);

    let start = Instant::now();
    let outcome = monitor.tick_at(Utc::now()).await;

    assert_eq!(outcome, TickOutcome::Exhausted);
    assert_eq!(monitor.report().counts().failed_connections, 1);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_run_once_reports_connected() {
    let server = spawn_server(|_| vec![("/generate_204", vec![NO_CONTENT.to_string()])]).await;
    let config = config_for(
        &[server.url("/generate_204")],
        &server.url("/portal/login"),
        "",
    );

    let outcome = run_once(config).await.expect("run_once");

    assert!(matches!(outcome, TickOutcome::Connected { .. }));
}
