//! Gradescope 仓储
//!
//! 组合会话管理器与页面解析器，对外提供以实体为单位的操作。每个公开方法是一次逻辑操作，
//! 拥有独立的重登录预算。

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::auth::{Credentials, ReloginBudget, SessionHandle, SessionManager};
use crate::config::Config;
use crate::error::{EntityType, GradescopeError, LookupError, Result, SessionError};
use crate::extractors::{
    extract_courses, extract_extension_students, extract_grades, extract_instructor_assignments,
    extract_outline, extract_page_csrf, extract_roster, extract_student_assignments,
    extract_submission_detail, extract_submissions,
};
use crate::infrastructure::transport::{
    HttpTransport, Method, Transport, TransportRequest, TransportResponse, Url,
};
use crate::models::{
    Assignment, Course, CourseRole, CourseSplit, EntityIndex, Extension, Grade, MemberRole,
    NewMember, Question, RosterMember, Submission, SubmissionDetail,
};
use crate::repository::pagination::{
    collect_pages, PageFailure, PageSource, Paged, PartialResult,
};
use crate::utils::truncate_text;

const ACCOUNT_PATH: &str = "/account";
const CSRF_HEADER: &str = "x-csrf-token";

/// 写操作最多提交的次数（会话在提交时过期会重新获取 token 再提交一次）
const MAX_WRITE_ATTEMPTS: usize = 2;

pub struct GradescopeRepository<T: Transport = HttpTransport> {
    session: SessionManager<T>,
    max_pages: usize,
}

impl GradescopeRepository<HttpTransport> {
    /// 使用 reqwest 传输层创建仓储
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Self::with_transport(transport, config)
    }
}

impl<T: Transport> GradescopeRepository<T> {
    pub fn with_transport(transport: T, config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        Ok(Self {
            session: SessionManager::new(transport, base_url),
            max_pages: config.max_pages.max(1),
        })
    }

    pub fn session(&self) -> &SessionManager<T> {
        &self.session
    }

    // ========== 会话 ==========

    pub async fn login(&self, credentials: Credentials) -> Result<SessionHandle> {
        Ok(self.session.login(credentials).await?)
    }

    pub async fn ensure_session(&self, credentials: Credentials) -> Result<SessionHandle> {
        Ok(self.session.ensure_session(credentials).await?)
    }

    pub async fn logout(&self) -> Result<()> {
        Ok(self.session.logout().await?)
    }

    // ========== 课程 ==========

    /// 账户中的课程，按页面顺序
    pub async fn list_courses(
        &self,
        handle: &SessionHandle,
        split: CourseSplit,
    ) -> Result<Vec<Course>> {
        let mut budget = ReloginBudget::new();
        let html = self.get_page(handle, ACCOUNT_PATH, &mut budget).await?;
        let courses: Vec<Course> = extract_courses(&html)?
            .into_iter()
            .filter(|c| split.includes(c.role))
            .collect();
        info!("📚 获取到 {} 门课程 ({:?})", courses.len(), split);
        Ok(courses)
    }

    /// 按 ID 查找课程，可限定身份；必须恰好匹配一门
    pub async fn find_course(
        &self,
        handle: &SessionHandle,
        course_id: &str,
        role: Option<CourseRole>,
    ) -> Result<Course> {
        let mut matches: Vec<Course> = self
            .list_courses(handle, CourseSplit::All)
            .await?
            .into_iter()
            .filter(|c| c.id == course_id && role.map_or(true, |r| c.role == r))
            .collect();

        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(LookupError::NotFound {
                entity: EntityType::Course,
                key: course_id.to_string(),
            }
            .into()),
            count => Err(LookupError::Ambiguous {
                entity: EntityType::Course,
                key: course_id.to_string(),
                count,
            }
            .into()),
        }
    }

    // ========== 作业 ==========

    /// 课程中的作业；教师与学生身份读取不同的页面
    pub async fn list_assignments(
        &self,
        handle: &SessionHandle,
        course: &Course,
    ) -> Result<Vec<Assignment>> {
        let mut budget = ReloginBudget::new();
        let assignments = match course.role {
            CourseRole::Instructor => {
                let html = self
                    .get_page(handle, &course.assignments_path(), &mut budget)
                    .await?;
                extract_instructor_assignments(&html, &course.id)?
            }
            CourseRole::Student => {
                let html = self.get_page(handle, &course.path(), &mut budget).await?;
                extract_student_assignments(&html, &course.id)?
            }
        };
        info!("📝 课程 {} 共 {} 个作业", course.display_name(), assignments.len());
        Ok(assignments)
    }

    pub async fn get_assignment(
        &self,
        handle: &SessionHandle,
        course: &Course,
        assignment_id: &str,
    ) -> Result<Assignment> {
        let index = EntityIndex::build(self.list_assignments(handle, course).await?)?;
        Ok(index.get_by_key(assignment_id)?.clone())
    }

    /// 作业大纲（仅教师可见）
    pub async fn get_outline(
        &self,
        handle: &SessionHandle,
        course: &Course,
        assignment: &Assignment,
    ) -> Result<Vec<Question>> {
        debug!("📋 读取课程 {} 作业 {} 的大纲", course.id, assignment.id);
        let mut budget = ReloginBudget::new();
        let path = format!("{}/outline/edit", assignment.path());
        let html = self.get_page(handle, &path, &mut budget).await?;
        Ok(extract_outline(&html, assignment)?)
    }

    // ========== 提交 ==========

    /// 作业的全部提交（分页）
    ///
    /// 某一页失败时返回之前各页的结果以及失败信息，不会丢弃已获取的数据
    pub async fn list_submissions(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
    ) -> PartialResult<Submission> {
        let start = match self.session.url(&assignment.submissions_path()) {
            Ok(url) => url,
            Err(e) => {
                return PartialResult::failed(PageFailure {
                    page: 1,
                    url: assignment.submissions_path(),
                    error: e.into(),
                })
            }
        };

        let mut source = SubmissionPages {
            repository: self,
            handle,
            assignment,
            budget: ReloginBudget::new(),
        };
        let result = collect_pages(
            start,
            self.max_pages,
            |s: &Submission| s.id.to_string(),
            &mut source,
        )
        .await;

        info!(
            "📄 作业 {} 获取到 {} 条提交（{} 页{}）",
            assignment.id,
            result.items.len(),
            result.pages_fetched,
            if result.is_complete() { "" } else { "，未完成" }
        );
        result
    }

    pub async fn get_submission(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
        submission_id: &str,
    ) -> Result<SubmissionDetail> {
        let mut budget = ReloginBudget::new();
        let path = format!("{}/submissions/{}", assignment.path(), submission_id);
        let html = self.get_page(handle, &path, &mut budget).await?;
        Ok(extract_submission_detail(&html, assignment)?)
    }

    // ========== 成员与成绩 ==========

    pub async fn list_roster(
        &self,
        handle: &SessionHandle,
        course: &Course,
    ) -> Result<Vec<RosterMember>> {
        let mut budget = ReloginBudget::new();
        let html = self
            .get_page(handle, &course.memberships_path(), &mut budget)
            .await?;
        Ok(extract_roster(&html, &course.id)?)
    }

    /// 当前账号在课程中各作业的成绩（学生视图）
    pub async fn list_grades(&self, handle: &SessionHandle, course: &Course) -> Result<Vec<Grade>> {
        let mut budget = ReloginBudget::new();
        let html = self.get_page(handle, &course.path(), &mut budget).await?;
        Ok(extract_grades(&html, &course.id)?)
    }

    // ========== 写操作 ==========

    /// 添加课程成员
    pub async fn add_roster_member(
        &self,
        handle: &SessionHandle,
        course: &Course,
        member: &NewMember,
    ) -> Result<()> {
        let path = course.memberships_path();
        let url = self.session.url(&path)?;
        let role = member.role.code().to_string();
        self.submit_write(handle, &path, |_, token| {
            let mut fields = vec![
                ("utf8", "✓"),
                ("user[name]", member.name.as_str()),
                ("user[email]", member.email.as_str()),
                ("user[sid]", member.sid.as_deref().unwrap_or("")),
                ("course_membership[role]", role.as_str()),
                ("button", ""),
            ];
            if member.notify {
                fields.push(("notify_by_email", "1"));
            }
            Ok(TransportRequest::post_form(url.clone(), fields).with_header(CSRF_HEADER, token))
        })
        .await?;
        info!("➕ 已添加成员 {} ({}) 到课程 {}", member.name, member.role, course.id);
        Ok(())
    }

    /// 移除课程成员
    pub async fn remove_roster_member(
        &self,
        handle: &SessionHandle,
        member: &RosterMember,
    ) -> Result<()> {
        let url = self.session.url(&member.path())?;
        let token_path = format!("/courses/{}/memberships", member.course_id);
        self.submit_write(handle, &token_path, |_, token| {
            Ok(delete_request(url.clone(), token))
        })
        .await?;
        info!("➖ 已从课程 {} 移除成员 {}", member.course_id, member.email);
        Ok(())
    }

    /// 修改成员角色，返回修改后的成员记录
    pub async fn change_member_role(
        &self,
        handle: &SessionHandle,
        member: &RosterMember,
        role: MemberRole,
    ) -> Result<RosterMember> {
        let url = self.session.url(&format!("{}/update_role", member.path()))?;
        let code = role.code().to_string();
        let token_path = format!("/courses/{}/memberships", member.course_id);
        self.submit_write(handle, &token_path, |_, token| {
            let fields = [("course_membership[role]", code.as_str())];
            Ok(TransportRequest::patch_form(url.clone(), fields).with_header(CSRF_HEADER, token))
        })
        .await?;
        info!("🔁 成员 {} 的角色: {} → {}", member.email, member.role, role);
        Ok(member.with_role(role))
    }

    /// 发布 / 撤回作业成绩
    pub async fn set_grades_published(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
        publish: bool,
    ) -> Result<()> {
        let url = self.session.url(&assignment.path())?;
        let value = if publish { "true" } else { "false" };
        let token_path = format!("/courses/{}/memberships", assignment.course_id);
        self.submit_write(handle, &token_path, |_, token| {
            Ok(
                TransportRequest::patch_form(url.clone(), [("assignment[published]", value)])
                    .with_header(CSRF_HEADER, token),
            )
        })
        .await?;
        info!(
            "📢 作业 {} 成绩已{}",
            assignment.id,
            if publish { "发布" } else { "撤回" }
        );
        Ok(())
    }

    /// 删除作业（连同全部提交）
    pub async fn remove_assignment(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
    ) -> Result<()> {
        let url = self.session.url(&assignment.path())?;
        let token_path = format!("/courses/{}/assignments", assignment.course_id);
        self.submit_write(handle, &token_path, |_, token| {
            Ok(delete_request(url.clone(), token))
        })
        .await?;
        info!("🗑️ 已删除作业 {} ({})", assignment.name, assignment.id);
        Ok(())
    }

    /// 为单个学生设置作业延期
    ///
    /// 学生按邮箱查找；延期页同时提供学生的用户 ID 和 CSRF token
    pub async fn apply_extension(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
        student_email: &str,
        extension: &Extension,
    ) -> Result<()> {
        let path = format!("{}/extensions", assignment.path());
        let url = self.session.url(&path)?;
        let settings = extension.settings(assignment);
        debug!("⏰ 延期设置: {}", serde_json::Value::Object(settings.clone()));

        self.submit_write(handle, &path, |html, token| {
            let students = extract_extension_students(html)?;
            let student = students
                .iter()
                .find(|s| s.email.eq_ignore_ascii_case(student_email))
                .ok_or_else(|| LookupError::NotFound {
                    entity: EntityType::Extension,
                    key: student_email.to_string(),
                })?;
            let body = json!({
                "override": {
                    "settings": settings.clone(),
                    "user_id": student.user_id.as_str(),
                }
            });
            Ok(TransportRequest::new(Method::POST, url.clone())
                .with_json(body)
                .with_header(CSRF_HEADER, token))
        })
        .await?;
        info!("⏰ 已为 {} 设置作业 {} 的延期", student_email, assignment.id);
        Ok(())
    }

    /// 撤销学生的延期（恢复作业原始设置）
    pub async fn remove_extension(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
        student_email: &str,
    ) -> Result<()> {
        self.apply_extension(handle, assignment, student_email, &Extension::default())
            .await
    }

    /// 下载成绩 CSV
    pub async fn download_scores_csv(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
    ) -> Result<String> {
        let mut budget = ReloginBudget::new();
        let path = format!("{}/scores.csv", assignment.path());
        self.get_page(handle, &path, &mut budget).await
    }

    /// 导出批改记录 CSV
    pub async fn export_evaluations(
        &self,
        handle: &SessionHandle,
        assignment: &Assignment,
    ) -> Result<String> {
        let mut budget = ReloginBudget::new();
        let path = format!("{}/export_evaluations", assignment.path());
        self.get_page(handle, &path, &mut budget).await
    }

    // ========== 内部 ==========

    async fn get_page(
        &self,
        handle: &SessionHandle,
        path: &str,
        budget: &mut ReloginBudget,
    ) -> Result<String> {
        let url = self.session.url(path)?;
        self.get_url(handle, url, budget).await
    }

    async fn get_url(
        &self,
        handle: &SessionHandle,
        url: Url,
        budget: &mut ReloginBudget,
    ) -> Result<String> {
        let request = TransportRequest::get(url);
        let response = self.session.execute_as(handle, &request, budget).await?;
        Ok(check_status(&request, response)?.body)
    }

    /// 读取 `token_path` 页面并从中取出 CSRF token 后提交写请求
    ///
    /// `build` 同时拿到页面内容，可以从同一页面读取提交所需的其他字段。
    /// token 与会话绑定：提交时会话过期则先重新登录（通过再次读取 token 页面触发），
    /// 再用新 token 重新提交
    async fn submit_write<F>(
        &self,
        handle: &SessionHandle,
        token_path: &str,
        build: F,
    ) -> Result<TransportResponse>
    where
        F: Fn(&str, &str) -> Result<TransportRequest>,
    {
        let mut budget = ReloginBudget::new();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let html = self.get_page(handle, token_path, &mut budget).await?;
            let token = extract_page_csrf(&html)?;
            let request = build(&html, &token)?;
            debug!("✏️ {} {}", request.method, request.url);

            let mut no_relogin = ReloginBudget::exhausted();
            match self
                .session
                .execute_as(handle, &request, &mut no_relogin)
                .await
            {
                Ok(response) => return check_status(&request, response),
                Err(SessionError::SessionExpired { relogin: None })
                    if budget.remaining() > 0 && attempt < MAX_WRITE_ATTEMPTS =>
                {
                    warn!("⚠️ 提交 {} 时会话过期，重新获取 token 后重试", request.url);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

/// Rails 风格的删除请求（POST + `_method=delete`）
fn delete_request(url: Url, token: &str) -> TransportRequest {
    TransportRequest::post_form(url, [("_method", "delete"), ("authenticity_token", token)])
        .with_header(CSRF_HEADER, token)
}

fn check_status(
    request: &TransportRequest,
    response: TransportResponse,
) -> Result<TransportResponse> {
    if response.is_success() {
        return Ok(response);
    }
    warn!(
        "❌ {} {} 返回 {}",
        request.method, request.url, response.status
    );
    debug!("响应内容: {}", truncate_text(&response.body, 200));
    Err(GradescopeError::UnexpectedStatus {
        url: response.url.to_string(),
        status: response.status.as_u16(),
    })
}

/// 提交列表的分页来源，整个列表共用一份重登录预算
struct SubmissionPages<'a, T: Transport> {
    repository: &'a GradescopeRepository<T>,
    handle: &'a SessionHandle,
    assignment: &'a Assignment,
    budget: ReloginBudget,
}

#[async_trait]
impl<'a, T: Transport> PageSource<Submission> for SubmissionPages<'a, T> {
    async fn fetch_page(&mut self, url: Url) -> Result<Paged<Submission>> {
        let html = self
            .repository
            .get_url(self.handle, url, &mut self.budget)
            .await?;
        let page = extract_submissions(&html, self.assignment)?;
        Ok(Paged {
            items: page.submissions,
            next: page.next_page,
        })
    }
}
