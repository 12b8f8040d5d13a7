// test_support.rs - 测试用的一次性 HTTP 服务
// 在本地端口上应答一个请求后退出，用来测试远程源和下载器

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;

pub struct Reply {
    status: u16,
    reason: &'static str,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            reason: "OK",
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn image(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            reason: "OK",
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
            body: body.to_vec(),
        }
    }

    pub fn status(status: u16, reason: &'static str) -> Self {
        Self {
            status,
            reason,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// 启动服务，返回形如 http://127.0.0.1:PORT 的地址
pub fn serve_once(reply: Reply) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };

        // 读完请求头即可，GET 请求没有 body
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let mut head = format!("HTTP/1.1 {} {}\r\n", reply.status, reply.reason);
        for (name, value) in &reply.headers {
            head.push_str(&format!("{}: {}\r\n", name, value));
        }
        head.push_str(&format!(
            "Content-Length: {}\r\nConnection: close\r\n\r\n",
            reply.body.len()
        ));

        let _ = stream.write_all(head.as_bytes());
        let _ = stream.write_all(&reply.body);
        let _ = stream.flush();
    });

    format!("http://{}", addr)
}

/// 一个必定连接失败的地址
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/missing.jpg", addr)
}
