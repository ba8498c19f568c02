//! 集成测试共用的脚本化传输层与页面

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use gradescope_client::config::Config;
use gradescope_client::error::TransportError;
use gradescope_client::infrastructure::{
    Method, StatusCode, Transport, TransportRequest, TransportResponse, Url,
};
use gradescope_client::{Credentials, GradescopeRepository};

pub const BASE_URL: &str = "https://gs.test";
pub const EMAIL: &str = "ada@example.edu";
pub const PAGE_TOKEN: &str = "page-token-42";

/// 预设的响应
#[derive(Debug, Clone)]
pub struct Reply {
    status: u16,
    /// 重定向后的最终路径；`None` 表示没有重定向
    final_path: Option<String>,
    body: String,
    cookie: Option<(String, String)>,
}

impl Reply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            final_path: None,
            body: body.into(),
            cookie: None,
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            status,
            ..Self::ok("")
        }
    }

    /// 被重定向到 `path` 后得到 200
    pub fn redirect_to(path: &str, body: impl Into<String>) -> Self {
        Self {
            final_path: Some(path.to_string()),
            ..Self::ok(body)
        }
    }

    pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
        self.cookie = Some((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Default)]
struct StubState {
    routes: HashMap<(Method, String), VecDeque<Reply>>,
    cookies: Vec<(String, String)>,
    requests: Vec<TransportRequest>,
    resets: usize,
}

/// 按 (方法, 路径) 返回预设响应的传输层
///
/// 同一路由的多个响应依次返回，最后一个会一直重复
#[derive(Default)]
pub struct StubTransport {
    state: Mutex<StubState>,
}

fn route_key(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, method: Method, path: &str, reply: Reply) -> Self {
        self.push(method, path, reply);
        self
    }

    pub fn push(&self, method: Method, path: &str, reply: Reply) {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// 带登录页与成功登录响应的传输层
    pub fn with_login() -> Self {
        Self::new()
            .on(Method::GET, "/", Reply::ok(LOGIN_PAGE))
            .on(
                Method::POST,
                "/login",
                Reply::redirect_to("/account", ACCOUNT_PAGE)
                    .with_cookie("_gradescope_session", "s3cr3t"),
            )
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.method == method && route_key(&r.url) == path)
            .count()
    }

    pub fn login_attempts(&self) -> usize {
        self.count(Method::POST, "/login")
    }

    pub fn resets(&self) -> usize {
        self.state.lock().unwrap().resets
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(
        &self,
        request: &TransportRequest,
    ) -> Result<TransportResponse, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let key = (request.method.clone(), route_key(&request.url));
        let reply = match state.routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
        .unwrap_or_else(|| Reply::status(404));

        if let Some(cookie) = reply.cookie.clone() {
            state.cookies.push(cookie);
        }

        let url = match &reply.final_path {
            Some(path) => request.url.join(path).unwrap(),
            None => request.url.clone(),
        };
        Ok(TransportResponse {
            status: StatusCode::from_u16(reply.status).unwrap(),
            url,
            redirected: reply.final_path.is_some(),
            headers: Default::default(),
            body: reply.body,
        })
    }

    fn reset_cookies(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.cookies.clear();
        state.resets += 1;
        Ok(())
    }

    fn cookie_header(&self, _url: &Url) -> Option<String> {
        let state = self.state.lock().unwrap();
        if state.cookies.is_empty() {
            return None;
        }
        Some(
            state
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

pub fn test_config() -> Config {
    Config {
        base_url: BASE_URL.to_string(),
        max_pages: 20,
        ..Config::default()
    }
}

pub fn repository(transport: StubTransport) -> GradescopeRepository<StubTransport> {
    GradescopeRepository::with_transport(transport, &test_config()).unwrap()
}

/// 分页上限为 `max_pages` 的仓储
pub fn repository_with_pages(
    transport: StubTransport,
    max_pages: usize,
) -> GradescopeRepository<StubTransport> {
    let config = Config {
        max_pages,
        ..test_config()
    };
    GradescopeRepository::with_transport(transport, &config).unwrap()
}

pub fn credentials() -> Credentials {
    Credentials::new(EMAIL, "correct horse")
}

// ========== 页面 ==========

pub const LOGIN_PAGE: &str = r#"
<html><body>
  <form action="/login" method="post" class="loginForm">
    <input type="hidden" name="utf8" value="✓">
    <input type="hidden" name="authenticity_token" value="login-token-1">
    <input type="email" name="session[email]">
    <input type="password" name="session[password]">
  </form>
</body></html>"#;

pub const MAINTENANCE_PAGE: &str = "<html><body><h1>Scheduled maintenance</h1></body></html>";

pub const ACCOUNT_PAGE: &str = r#"
<html><body>
  <h1 class="pageHeading">Instructor Courses</h1>
  <div class="courseList">
    <div class="courseList--term">Fall 2024</div>
    <div class="courseList--coursesForTerm">
      <a class="courseBox" href="/courses/5">
        <h3 class="courseBox--shortname">CS 5</h3>
        <div class="courseBox--name">Systems Programming</div>
        <div class="courseBox--assignments">1 assignment</div>
      </a>
    </div>
  </div>
  <h2 class="pageHeading">Student Courses</h2>
  <div class="courseList">
    <div class="courseList--term">Fall 2024</div>
    <div class="courseList--coursesForTerm">
      <a class="courseBox" href="/courses/8">
        <h3 class="courseBox--shortname">MATH 8</h3>
        <div class="courseBox--name">Linear Algebra</div>
      </a>
    </div>
  </div>
</body></html>"#;

pub const INSTRUCTOR_ASSIGNMENTS_PAGE: &str = r#"
<html><head><meta name="csrf-token" content="page-token-42"></head><body>
  <div data-react-class="AssignmentsTable"
       data-react-props='{"table_data":[{"id":"assignment_11","title":"Homework 1","total_points":"10.0","num_active_submissions":3}]}'></div>
</body></html>"#;

pub const MEMBERSHIPS_PAGE: &str = r#"
<html><head><meta name="csrf-token" content="page-token-42"></head><body>
<table>
  <tbody>
    <tr class="rosterRow">
      <td><button class="rosterCell--editIcon" data-id="301" data-email="ada@example.edu"
           data-role="1" data-cm='{"full_name":"Ada Lovelace","sid":null}'></button></td>
    </tr>
    <tr class="rosterRow">
      <td><button class="rosterCell--editIcon" data-id="302" data-email="alan@example.edu"
           data-role="0" data-cm='{"full_name":"Alan Turing","sid":"A123"}'></button></td>
    </tr>
  </tbody>
</table>
</body></html>"#;

/// 提交列表的一页，`ids` 为提交 ID
pub fn submissions_page(ids: &[u32], next: Option<&str>) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr>
                  <td><a href="/courses/5/assignments/11/submissions/{id}">Student {id}</a></td>
                  <td class="submissionsTable--email">s{id}@example.edu</td>
                  <td class="submissionsTable--score">{id}</td>
                </tr>"#
            )
        })
        .collect();
    let next = next
        .map(|href| format!(r#"<a rel="next" href="{}">Next</a>"#, href))
        .unwrap_or_default();
    format!(
        r#"<html><body><table id="submissions-table"><tbody>{}</tbody></table>{}</body></html>"#,
        rows, next
    )
}

pub const STUDENT_COURSE_PAGE: &str = r#"
<html><body>
<table id="assignments-student-table">
  <tbody>
    <tr>
      <th class="table--primaryLink" scope="row">
        <a href="/courses/8/assignments/21/submissions/951">Problem Set 1</a>
      </th>
      <td class="submissionStatus"><div class="submissionStatus--score">7.5 / 10.0</div></td>
    </tr>
    <tr>
      <th class="table--primaryLink" scope="row">
        <button class="js-submitAssignment" data-assignment-id="22">Problem Set 2</button>
      </th>
      <td class="submissionStatus"><div class="submissionStatus--text">No Submission</div></td>
    </tr>
  </tbody>
</table>
</body></html>"#;

pub const OUTLINE_PAGE: &str = r#"
<html><body>
  <div data-react-class="AssignmentOutline"
       data-react-props='{"outline":[{"id":61,"title":"Q1","weight":"4.0","type":"QuestionGroup","children":[{"id":62,"title":"Q1.1","weight":4.0,"parent_id":61}]},{"id":63,"title":"Q2","weight":6}]}'></div>
</body></html>"#;

pub const SUBMISSION_VIEWER_PAGE: &str = r#"
<html><body>
  <div data-react-class="AssignmentSubmissionViewer"
       data-react-props='{"assignment":{"id":11,"total_points":"10.0"},"assignment_submission":{"id":901,"score":"8.5","status":"graded"},"submission_owners":[{"name":"Alan Turing","email":"alan@example.edu"}]}'></div>
</body></html>"#;

pub const EXTENSIONS_PAGE: &str = r#"
<html><head><meta name="csrf-token" content="page-token-42"></head><body>
<ul>
  <li data-react-class="AddExtension"
      data-react-props='{"students":[{"id":7001,"email":"alan@example.edu","name":"Alan Turing"}]}'></li>
</ul>
</body></html>"#;
