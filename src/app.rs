use gloo_timers::future::TimeoutFuture;
use leptos::ev::SubmitEvent;
use leptos::logging::{error, log};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::{provide_meta_context, MetaTags, Stylesheet, Title};
use leptos_router::{
    components::{Route, Router, Routes},
    path,
};

use crate::api::{ApiConfig, ApiError};
use crate::model::{
    Action, Activity, Banner, BannerKind, Catalog, Category, SortMode, LOAD_FAILURE,
    MESSAGE_TIMEOUT_MS,
};
use crate::{compute_view, settle_mutation, signup_fields};

pub fn shell(options: LeptosOptions) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang="en">
            <head>
                <meta charset="utf-8" />
                <meta name="viewport" content="width=device-width, initial-scale=1" />
                <AutoReload options=options.clone() />
                <HydrationScripts options />
                <MetaTags />
            </head>
            <body>
                <App />
            </body>
        </html>
    }
}

#[component]
pub fn App() -> impl IntoView {
    // Provides context that manages stylesheets, titles, meta tags, etc.
    provide_meta_context();

    view! {
        // id=leptos means cargo-leptos will hot-reload this stylesheet
        <Stylesheet id="leptos" href="/pkg/activity-board.css" />

        <Title text="School Activities" />

        <Router>
            <header>
                <h1>"School Activities"</h1>
                <h2>"Extracurricular Activities"</h2>
            </header>
            <main>
                <Routes fallback=|| "Page not found.".into_view()>
                    <Route path=path!("/") view=ActivityBoard />
                </Routes>
            </main>
        </Router>
    }
}

/// The signup board: toolbar, activity list, and signup form.
///
/// The component owns the catalog. Every mutation that succeeds refetches it, and the list and
/// the activity dropdown are both derived from the same memoized view.
#[component]
fn ActivityBoard() -> impl IntoView {
    let api = ApiConfig::from_build_env();

    let catalog = RwSignal::new(Catalog::new());
    let loading = RwSignal::new(true);
    let load_failed = RwSignal::new(false);

    // Toolbar.
    let search = RwSignal::new(String::new());
    let category = RwSignal::new(None::<Category>);
    let sort = RwSignal::new(SortMode::Default);

    // Signup form.
    let selected_activity = RwSignal::new(String::new());
    let email = RwSignal::new(String::new());

    let banner = RwSignal::new(Banner::default());

    let board = Memo::new(move |_| {
        catalog.with(|activities| {
            search.with(|text| compute_view(activities, text, category.get(), sort.get()))
        })
    });

    // Replaces the catalog on success. On failure the previous catalog is kept, and the list shows
    // an error instead.
    let load_catalog = move || {
        spawn_local(async move {
            match api.fetch_catalog().await {
                Ok(activities) => {
                    catalog.set(activities);
                    load_failed.set(false);
                }
                Err(e) => {
                    error!("Error fetching activities: {}", e);
                    load_failed.set(true);
                }
            }
            loading.set(false);
        });
    };

    // Effects only run in the browser, so the catalog is fetched once after hydration.
    Effect::new(move || load_catalog());

    // Drops the selection once the chosen activity leaves the view, the same way rebuilding the
    // options would.
    Effect::new(move || {
        let selected = selected_activity.get_untracked();
        if !selected.is_empty() && !board.with(|view| view.iter().any(|(name, _)| *name == selected))
        {
            selected_activity.set(String::new());
        }
    });

    // Shows a message and arms its hide timer. A newer message makes older timers no-ops.
    let notify = move |kind: BannerKind, text: String| {
        let mut generation = 0;
        banner.update(|b| generation = b.show(kind, text));
        spawn_local(async move {
            TimeoutFuture::new(MESSAGE_TIMEOUT_MS).await;
            banner.update(|b| {
                b.expire(generation);
            });
        });
    };

    // Reports how a signup or unregister request went. Returns true if it succeeded.
    let settle = move |action: Action, result: Result<String, ApiError>| {
        if let Err(e) = &result {
            error!("Error {}: {}", action.verb(), e);
        }
        settle_mutation(action, result, notify, load_catalog)
    };

    let signup_submit = move |ev: SubmitEvent| {
        ev.prevent_default();
        let (activity, address) =
            match signup_fields(&selected_activity.get(), &email.get()) {
                Ok(fields) => fields,
                Err(message) => {
                    notify(BannerKind::Error, message.to_string());
                    return;
                }
            };
        spawn_local(async move {
            log!("Signing up {} for {}", address, activity);
            let result = api.signup(&activity, &address).await;
            if settle(Action::Signup, result) {
                selected_activity.set(String::new());
                email.set(String::new());
            }
        });
    };

    let unregister = Callback::new(move |(activity, address): (String, String)| {
        spawn_local(async move {
            log!("Unregistering {} from {}", address, activity);
            let result = api.unregister(&activity, &address).await;
            settle(Action::Unregister, result);
        });
    });

    view! {
        <div class="board">
            <section id="activities-container">
                <h3>"Available Activities"</h3>
                <div class="toolbar">
                    <input
                        type="text"
                        id="search-input"
                        placeholder="Search activities..."
                        prop:value=move || search.get()
                        on:input=move |ev| search.set(event_target_value(&ev))
                    />
                    <select
                        id="sort-select"
                        prop:value=move || sort.get().as_value()
                        on:change=move |ev| sort.set(SortMode::from_value(&event_target_value(&ev)))
                    >
                        <option value="">"Default order"</option>
                        <option value="name">"Name"</option>
                        <option value="spots">"Spots left"</option>
                    </select>
                    <select
                        id="category-select"
                        prop:value=move || category.get().map(Category::as_str).unwrap_or("")
                        on:change=move |ev| {
                            category.set(Category::from_value(&event_target_value(&ev)))
                        }
                    >
                        <option value="">"All categories"</option>
                        {Category::ALL
                            .into_iter()
                            .map(|c| view! { <option value=c.as_str()>{c.as_str()}</option> })
                            .collect_view()}
                    </select>
                </div>
                <div id="activities-list">
                    {move || {
                        if load_failed.get() {
                            view! { <p>{LOAD_FAILURE}</p> }.into_any()
                        } else if loading.get() {
                            view! { <p>"Loading activities..."</p> }.into_any()
                        } else {
                            board
                                .get()
                                .into_iter()
                                .map(|(name, activity)| {
                                    view! { <ActivityCard name activity on_unregister=unregister /> }
                                })
                                .collect_view()
                                .into_any()
                        }
                    }}
                </div>
            </section>

            <section id="signup-container">
                <h3>"Sign Up for an Activity"</h3>
                <form id="signup-form" on:submit=signup_submit>
                    <div class="form-group">
                        <label for="email">"Student Email:"</label>
                        <input
                            type="email"
                            id="email"
                            required
                            placeholder="your-email@school.edu"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="form-group">
                        <label for="activity">"Select Activity:"</label>
                        <select
                            id="activity"
                            required
                            prop:value=move || selected_activity.get()
                            on:change=move |ev| selected_activity.set(event_target_value(&ev))
                        >
                            {move || {
                                let names = board.with(|view| {
                                    view.iter().map(|(name, _)| name.clone()).collect::<Vec<_>>()
                                });
                                view! { <ActivityOptions names /> }
                            }}
                        </select>
                    </div>
                    <button type="submit">"Sign Up"</button>
                </form>
                <div id="message" class=move || banner.with(Banner::css_class)>
                    {move || banner.with(|b| b.text().to_string())}
                </div>
            </section>
        </div>
    }
}

/// One activity in the list. Each participant row gets its own unregister button.
#[component]
fn ActivityCard(
    name: String,
    activity: Activity,
    on_unregister: Callback<(String, String)>,
) -> impl IntoView {
    let category = Category::for_activity(&name);
    let spots_left = activity.spots_left();

    let participants = if activity.participants.is_empty() {
        view! {
            <p>
                <em>"No participants yet"</em>
            </p>
        }
        .into_any()
    } else {
        view! {
            <div class="participants-section">
                <h5>"Participants:"</h5>
                <ul class="participants-list">
                    {activity
                        .participants
                        .iter()
                        .map(|participant| {
                            let target = (name.clone(), participant.clone());
                            view! {
                                <li>
                                    <span class="participant-email">{participant.clone()}</span>
                                    <button
                                        class="delete-btn"
                                        title="Unregister"
                                        on:click=move |_| on_unregister.run(target.clone())
                                    >
                                        "❌"
                                    </button>
                                </li>
                            }
                        })
                        .collect_view()}
                </ul>
            </div>
        }
        .into_any()
    };

    view! {
        <div class="activity-card">
            <h4>{name.clone()}</h4>
            <p>{activity.description.clone()}</p>
            <p>
                <strong>"Schedule:"</strong>
                " "
                {activity.schedule.clone()}
            </p>
            <p>
                <strong>"Availability:"</strong>
                " "
                {format!("{} spots left", spots_left)}
            </p>
            <p>
                <strong>"Category:"</strong>
                " "
                {category.as_str()}
            </p>
            <div class="participants-container">{participants}</div>
        </div>
    }
}

/// The signup dropdown: the placeholder first, then one option per visible activity. Rebuilt
/// whenever the view changes.
#[component]
fn ActivityOptions(names: Vec<String>) -> impl IntoView {
    view! {
        <option value="">"-- Select an activity --"</option>
        {names
            .into_iter()
            .map(|name| {
                let value = name.clone();
                view! { <option value=value>{name}</option> }
            })
            .collect_view()}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_card(name: &str, max_participants: u32, participants: &[&str]) -> String {
        let owner = Owner::new();
        owner.with(|| {
            let activity = Activity {
                description: "Learn strategies and compete".to_string(),
                schedule: "Fridays, 3:30 PM - 5:00 PM".to_string(),
                max_participants,
                participants: participants.iter().map(|p| p.to_string()).collect(),
            };
            let on_unregister = Callback::new(|_: (String, String)| {});
            view! { <ActivityCard name=name.to_string() activity on_unregister /> }.to_html()
        })
    }

    #[test]
    fn test_card_without_participants() {
        let html = render_card("Chess Club", 12, &[]);
        assert!(html.contains("Chess Club"));
        assert!(html.contains("Fridays, 3:30 PM - 5:00 PM"));
        assert!(html.contains("12 spots left"));
        assert!(html.contains("Academic"));
        assert!(html.contains("No participants yet"));
        assert!(!html.contains("participants-list"));
        assert!(!html.contains("delete-btn"));
    }

    #[test]
    fn test_card_with_participants() {
        let html = render_card("Robotics", 10, &["michael@x.edu", "daniel@x.edu"]);
        assert!(html.contains("8 spots left"));
        assert!(html.contains("Other"));
        assert!(html.contains("michael@x.edu"));
        assert!(html.contains("daniel@x.edu"));
        assert!(!html.contains("No participants yet"));
        // One unregister button per participant.
        assert_eq!(html.matches("class=\"delete-btn\"").count(), 2);
    }

    #[test]
    fn test_activity_options_start_with_placeholder() {
        let owner = Owner::new();
        let html = owner.with(|| {
            let names = vec!["Art Club".to_string(), "Chess Club".to_string()];
            view! { <ActivityOptions names /> }.to_html()
        });
        let placeholder = html
            .find("-- Select an activity --")
            .expect("placeholder option");
        let art = html.find("Art Club").expect("Art Club option");
        let chess = html.find("Chess Club").expect("Chess Club option");
        assert!(placeholder < art);
        assert!(art < chess);
        assert_eq!(html.matches("<option").count(), 3);

        let html = owner.with(|| view! { <ActivityOptions names=Vec::new() /> }.to_html());
        assert_eq!(html.matches("<option").count(), 1);
        assert!(html.contains("-- Select an activity --"));
    }
}
