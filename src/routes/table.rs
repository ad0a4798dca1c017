//! Static page table for both portals.

#[cfg(test)]
#[path = "table_test.rs"]
mod table_test;

/// Which area of the app a page belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Area {
    Public,
    User,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRoute {
    pub path: &'static str,
    pub title: &'static str,
    pub area: Area,
}

const fn page(path: &'static str, title: &'static str, area: Area) -> PageRoute {
    PageRoute { path, title, area }
}

pub const PAGES: &[PageRoute] = &[
    page("/", "首页", Area::Public),
    page("/legal/user-agreement", "用户协议", Area::Public),
    page("/legal/privacy-policy", "隐私政策", Area::Public),
    page("/user/login", "用户登录", Area::User),
    page("/user/register", "用户注册", Area::User),
    page("/user/forgot", "找回密码", Area::User),
    page("/user/dashboard", "控制台", Area::User),
    page("/user/apply", "申请域名", Area::User),
    page("/user/domains", "我的域名", Area::User),
    page("/user/invite", "邀请好友", Area::User),
    page("/user/recharge", "充值", Area::User),
    page("/user/profile", "个人资料", Area::User),
    page("/user/announcements", "公告", Area::User),
    page("/user/github-tasks", "GitHub 任务", Area::User),
    page("/admin/login", "管理员登录", Area::Admin),
    page("/admin/dashboard", "管理概览", Area::Admin),
    page("/admin/cf-accounts", "Cloudflare 账户", Area::Admin),
    page("/admin/zones", "域名区域", Area::Admin),
    page("/admin/dns-records", "DNS 记录", Area::Admin),
    page("/admin/users", "用户管理", Area::Admin),
    page("/admin/invites", "邀请码", Area::Admin),
    page("/admin/cards", "充值卡", Area::Admin),
    page("/admin/points-logs", "积分记录", Area::Admin),
    page("/admin/featured-sites", "精选站点", Area::Admin),
    page("/admin/settings", "系统设置", Area::Admin),
    page("/admin/github-tasks", "GitHub 任务", Area::Admin),
];

/// Look up a page by exact path. A single trailing slash is ignored.
#[must_use]
pub fn find(path: &str) -> Option<&'static PageRoute> {
    let path = match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    };
    PAGES.iter().find(|page| page.path == path)
}
