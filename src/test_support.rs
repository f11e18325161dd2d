// src/test_support.rs
//! Fixtures shared by unit tests

use crate::core::Database;
use crate::models::{DisabilityStatus, Job, Role, User};
use crate::repositories::jobs::NewJob;
use crate::repositories::users::NewUser;
use crate::repositories::{JobRepository, UserRepository};

pub async fn user(db: &Database, email: &str, role: Role, skills: &str) -> User {
    UserRepository::new(db.pool())
        .create(&NewUser {
            name: email.split('@').next().unwrap_or("user").to_string(),
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role,
            education: "Bachelors Degree".to_string(),
            skills: skills.to_string(),
            disability_status: DisabilityStatus::NonPwd,
            is_verified: true,
        })
        .await
        .expect("insert user")
        .expect("unique email")
}

pub async fn job(db: &Database, admin_id: i64, title: &str, skills: &str) -> Job {
    JobRepository::new(db.pool())
        .create(&NewJob {
            title: title.to_string(),
            description: format!("{} description", title),
            education: "Bachelors Degree".to_string(),
            skills: skills.to_string(),
            employment_type: "Full-time".to_string(),
            disability_status: DisabilityStatus::NonPwd,
            admin_id,
        })
        .await
        .expect("insert job")
}

/// Local HTTP endpoint answering every request with `200` and the JSON `body`.
/// Returns its base URL.
pub async fn json_endpoint(body: &'static str) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local endpoint");
    let addr = listener.local_addr().expect("local endpoint address");

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut chunk = [0u8; 4096];
                loop {
                    let n = match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => n,
                    };
                    request.extend_from_slice(&chunk[..n]);
                    if let Some(end) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                        let head = String::from_utf8_lossy(&request[..end]).to_lowercase();
                        let length = head
                            .lines()
                            .find_map(|line| line.strip_prefix("content-length:"))
                            .and_then(|v| v.trim().parse::<usize>().ok())
                            .unwrap_or(0);
                        if request.len() >= end + 4 + length {
                            break;
                        }
                    }
                }

                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}
