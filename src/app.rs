//! Root application component: session store, navigation guard, expiry
//! escalation, and routing.

use std::rc::Rc;

use leptos::prelude::*;
use leptos_meta::{Title, provide_meta_context};
use leptos_router::NavigateOptions;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::hooks::{use_location, use_navigate};
use leptos_router::path;

use crate::config::PortalConfig;
use crate::net::api::HttpAuthApi;
use crate::net::types::UserProfile;
use crate::routes::escalator;
use crate::routes::guard::{self, GuardDecision};
use crate::routes::table::{self, Area, PageRoute};
use crate::state::store::AuthStore;
use crate::util::navigation::Navigator;
use crate::util::storage::{KeyValueStore, MemoryStore};

/// Session store handle provided through context.
pub type StoreHandle = StoredValue<Rc<AuthStore>, LocalStorage>;

/// Wire the store to the browser collaborators (or in-memory ones outside
/// the browser).
#[must_use]
pub fn build_store(config: PortalConfig) -> AuthStore {
    let api = Rc::new(HttpAuthApi::new(&config));
    AuthStore::new(config, open_storage(), api, navigator())
}

#[cfg(feature = "csr")]
fn open_storage() -> Rc<dyn KeyValueStore> {
    match crate::util::storage::LocalStorage::open() {
        Ok(storage) => Rc::new(storage),
        Err(e) => {
            log::warn!("local storage unavailable, sessions will not survive a reload: {e}");
            Rc::new(MemoryStore::new())
        }
    }
}

#[cfg(not(feature = "csr"))]
fn open_storage() -> Rc<dyn KeyValueStore> {
    Rc::new(MemoryStore::new())
}

#[cfg(feature = "csr")]
fn navigator() -> Rc<dyn Navigator> {
    Rc::new(crate::util::navigation::BrowserNavigator)
}

#[cfg(not(feature = "csr"))]
fn navigator() -> Rc<dyn Navigator> {
    Rc::new(crate::util::navigation::MemoryNavigator::at("/"))
}

/// Root application component.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = PortalConfig::load();
    let title = config.title.clone();
    log::info!("starting {title} portal ({:?})", config.environment);

    let store = build_store(config);
    store.init();
    let store: StoreHandle = StoredValue::new_local(Rc::new(store));
    provide_context(store);

    view! {
        <Title text=title/>

        <Router>
            <PortalShell/>
        </Router>
    }
}

#[component]
fn PortalShell() -> impl IntoView {
    install_navigation_guard();

    view! {
        <Routes fallback=|| view! { <NotFound/> }>
            <Route path=path!("/") view=PortalPage/>
            <Route path=path!("/*any") view=PortalPage/>
        </Routes>
    }
}

/// Evaluate the guard on every location change and redirect when it says so.
/// A redirect keeps the previous path, so the follow-up check sees where the
/// navigation started.
fn install_navigation_guard() {
    let store = expect_context::<StoreHandle>();
    let location = use_location();
    let navigate = use_navigate();
    let previous = StoredValue::new(store.with_value(|s| s.config().routes.root.clone()));

    Effect::new(move |_| {
        let target = location.pathname.get();
        let decision = store.with_value(|s| previous.with_value(|prev| guard::evaluate(&target, prev, s)));
        match decision {
            GuardDecision::Proceed => previous.set_value(target),
            GuardDecision::Redirect(to) => {
                navigate(&to, NavigateOptions { replace: true, ..NavigateOptions::default() });
            }
        }
    });
}

#[component]
fn PortalPage() -> impl IntoView {
    let store = expect_context::<StoreHandle>();
    let location = use_location();

    move || {
        let path = location.pathname.get();
        match table::find(&path) {
            Some(page) => {
                let needs_profile =
                    page.area == Area::User && !store.with_value(|s| s.config().routes.is_user_public(page.path));
                view! { <PageFrame page needs_profile/> }.into_any()
            }
            None => view! { <NotFound/> }.into_any(),
        }
    }
}

#[component]
fn PageFrame(page: &'static PageRoute, needs_profile: bool) -> impl IntoView {
    view! {
        <section class="portal-page">
            <header class="portal-page__header">
                <h1>{page.title}</h1>
                {needs_profile.then(|| view! { <UserBadge/> })}
            </header>
        </section>
    }
}

/// Current user's name, refreshed from the backend. Fetch errors go through
/// the expiry escalator.
#[component]
fn UserBadge() -> impl IntoView {
    let store = expect_context::<StoreHandle>();
    let profile = LocalResource::new(move || {
        let store = store.get_value();
        async move { store.refresh_user_info().await }
    });

    let fallback = move |errors: ArcRwSignal<Errors>| {
        errors.with_untracked(|errors| {
            store.with_value(|s| {
                for (_, error) in errors.iter() {
                    escalator::escalate(&error.to_string(), s);
                }
            });
        });
        view! { <span class="user-badge user-badge--error">"资料加载失败"</span> }
    };

    view! {
        <ErrorBoundary fallback>
            <Suspense fallback=|| view! { <span class="user-badge">"…"</span> }>
                {move || Suspend::new(async move {
                    profile.await.map(|p| view! { <span class="user-badge">{display_name(&p)}</span> })
                })}
            </Suspense>
        </ErrorBoundary>
    }
}

fn display_name(profile: &UserProfile) -> String {
    profile.display_name.clone().unwrap_or_else(|| profile.username.clone())
}

#[component]
fn NotFound() -> impl IntoView {
    view! {
        <div class="not-found">
            <h1>"404"</h1>
            <a href="/">"返回首页"</a>
        </div>
    }
}
