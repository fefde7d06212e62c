use dioxus::prelude::*;
use dioxus_router::{Link, Outlet, Routable};

use crate::context::AppContext;
use crate::views::{CourseView, HomeView};

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
pub enum Route {
    #[layout(Layout)]
        #[route("/", HomeView)] Home {},
        #[route("/courses/:course_id", CourseView)] Course { course_id: u64 },
}

#[component]
fn Layout() -> Element {
    rsx! {
        div { class: "app",
            Sidebar {}
            main { class: "content",
                Outlet::<Route> {}
            }
        }
    }
}

#[component]
fn Sidebar() -> Element {
    let ctx = use_context::<AppContext>();
    let account = ctx
        .user_id()
        .map_or_else(|| "Not signed in".to_string(), |user| format!("Signed in as {user}"));

    rsx! {
        nav { class: "sidebar",
            h1 { "Courses" }
            ul {
                li { Link { to: Route::Home {}, "All courses" } }
            }
            p { class: "sidebar-account", "{account}" }
        }
    }
}
