use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{
    auth::SignInForm,
    error::{Field, ValidationErrors},
    form::{FormMode, MovieForm},
    listing::{CatalogList, PAGE_SIZE, Pagination},
    models::{Movie, Poster},
    notify::{Level, Navigation, Notice},
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const DATASTAR_CDN: &str =
    "https://cdn.jsdelivr.net/npm/@sudodevnull/datastar@0.19.9/dist/datastar.js";

const INPUT_CLASS: &str = "w-full h-[45px] px-4 rounded-lg bg-[#224957] text-white border border-[#224957] focus:outline-none focus:ring-2 focus:ring-[#2BD17E]";

pub fn sign_in_page(
    form: &SignInForm,
    errors: Option<&ValidationErrors>,
    notice: Option<&Notice>,
) -> String {
    page(
        "Sign In",
        notice,
        html! {
            div class="min-h-screen flex items-center justify-center px-6" {
                div class="w-full max-w-sm" {
                    h1 class="text-5xl font-semibold text-center mb-10" { "Sign In" }
                    form class="space-y-6" method="post" action="/sign-in" {
                        div {
                            input class=(INPUT_CLASS) id="email" name="email" type="email" placeholder="Email" value=(form.email);
                            (field_error(errors, Field::Email))
                        }
                        div {
                            input class=(INPUT_CLASS) id="password" name="password" type="password" placeholder="Password";
                            (field_error(errors, Field::Password))
                        }
                        button class="w-full h-[54px] rounded-lg bg-[#2BD17E] text-white font-semibold text-lg hover:bg-green-600" type="submit" { "Login" }
                    }
                }
            }
        },
    )
}

/// List shell shown while the catalog is loading; the grid arrives as a fragment.
pub fn list_page(page_number: i64, notice: Option<&Notice>) -> String {
    let url = format!("/movies/grid?page={page_number}");

    page(
        "My Movies",
        notice,
        html! {
            div id="content" class="max-w-7xl mx-auto p-8" data-indicator:fetching data-init=(PreEscaped(format!("@get('{}')", url))) {
                div class="grid grid-cols-2 md:grid-cols-4 gap-6" {
                    @for _ in 0..PAGE_SIZE {
                        div class="skeleton rounded-xl bg-[#092C39] p-2 animate-pulse" {
                            div class="h-[300px] rounded-lg bg-[#224957]" {}
                            div class="mt-4 h-4 w-3/5 rounded bg-[#224957]" {}
                            div class="mt-2 h-4 w-2/5 rounded bg-[#224957]" {}
                        }
                    }
                }
            }
        },
    )
}

pub fn grid_fragment(list: &CatalogList, notice: Option<&Notice>) -> String {
    let Some(pagination) = list.pagination() else {
        return content_div(notice, html! {});
    };

    if list.is_empty() {
        return content_div(notice, empty_state());
    }

    // the whole list ships once; paging only flips the `page` signal
    let current = pagination.current_page();

    content_div(notice, html! {
        div class="max-w-7xl mx-auto p-8" data-signals:page=(current) {
            div class="flex items-center justify-between mb-12" {
                h1 class="flex items-center gap-3 text-3xl md:text-5xl font-semibold" {
                    span { "My Movies" }
                    a class="text-2xl hover:text-[#2BD17E]" href=(Navigation::Create.path()) title="Add a new movie" { "+" }
                }
                form method="post" action="/sign-out" {
                    button class="font-semibold hover:text-[#2BD17E]" type="submit" { "Logout" }
                }
            }
            @for (p, movies) in list.pages() {
                @let n = p.current_page();
                div class="page-group" data-page=(n) data-show=(format!("$page == {n}")) style=[(n != current).then_some("display: none")] {
                    div class="movie-grid grid grid-cols-2 md:grid-cols-4 gap-6" {
                        @for movie in movies {
                            (movie_card(movie))
                        }
                    }
                    @if list.shows_pagination() {
                        (pagination_controls(&p))
                    }
                }
            }
        }
    })
}

pub fn movie_form_page(
    form: &MovieForm,
    errors: Option<&ValidationErrors>,
    notice: Option<&Notice>,
) -> String {
    let (heading, action, submit_label) = match form.mode() {
        FormMode::Create => ("Create a new movie", "/movies".to_string(), "Submit"),
        FormMode::Edit(id) => {
            ("Edit Movie", format!("/movies/{}", urlencoding::encode(id.as_str())), "Save")
        },
    };
    let poster_url = form.poster().and_then(Poster::url);

    page(
        heading,
        notice,
        html! {
            div class="w-full max-w-7xl mx-auto p-8" {
                h1 class="text-[28px] md:text-[48px] font-semibold mb-8" { (heading) }
                form class="movie-form flex flex-col md:flex-row gap-12" method="post" action=(action) enctype="multipart/form-data" {
                    div class="relative flex-1 flex flex-col items-center justify-center min-h-[380px] border-2 border-dashed border-white rounded-[10px] bg-[#224957]" {
                        input class="absolute inset-0 opacity-0 cursor-pointer" type="file" name="poster" accept="image/*";
                        @if let Some(url) = poster_url {
                            img class="poster-preview max-w-full max-h-full object-cover rounded-md" src=(url) alt="Movie Poster";
                            input type="hidden" name="poster_url" value=(url);
                        } @else {
                            span class="text-white text-sm" { "Upload an image here" }
                        }
                        (field_error(errors, Field::Poster))
                    }
                    div class="flex-1 flex flex-col space-y-6 max-w-md" {
                        div {
                            input class=(INPUT_CLASS) type="text" name="title" placeholder="Title" value=(form.title());
                            (field_error(errors, Field::Title))
                        }
                        div {
                            input class=(INPUT_CLASS) type="text" name="year" placeholder="Publishing year" value=(form.year());
                            (field_error(errors, Field::Year))
                        }
                        div class="flex gap-4" {
                            a class="w-1/2 px-6 py-4 text-center bg-[#093545] text-white rounded-lg border border-white font-semibold hover:bg-[#2BD17E]" href=(Navigation::List.path()) { "Cancel" }
                            button class="w-1/2 px-6 py-4 bg-[#2BD17E] text-white rounded-lg font-semibold hover:bg-green-600" type="submit" disabled[form.submitting()] {
                                @if form.submitting() { "Submitting..." } @else { (submit_label) }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        None,
        html! {
            div class="min-h-screen flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="rounded-lg bg-[#092C39] p-8" {
                        h1 class="text-2xl font-bold" { "Error" }
                        p class="mt-4" { (message) }
                        a class="mt-6 inline-block text-[#2BD17E]" href=(Navigation::List.path()) { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, notice: Option<&Notice>, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
                script type="module" src=(DATASTAR_CDN) {}
            }
            body class="min-h-screen bg-[#093545] text-white" {
                @if let Some(notice) = notice {
                    (notice_toast(notice))
                }
                (body)
            }
        }
    }
    .into_string()
}

fn content_div(notice: Option<&Notice>, inner: Markup) -> String {
    html! {
        div id="content" {
            @if let Some(notice) = notice {
                (notice_toast(notice))
            }
            (inner)
        }
    }
    .into_string()
}

fn notice_toast(notice: &Notice) -> Markup {
    let (kind, colour) = match notice.level {
        Level::Success => ("success", "bg-[#2BD17E]"),
        Level::Error => ("error", "bg-[#EB5757]"),
    };

    html! {
        div id="notice" class=(format!("notice notice-{kind} fixed top-4 right-4 rounded-lg px-4 py-3 font-semibold {colour}")) role="status" {
            (notice.message)
        }
    }
}

fn field_error(errors: Option<&ValidationErrors>, field: Field) -> Markup {
    html! {
        @if let Some(message) = errors.and_then(|e| e.for_field(field)) {
            p class="field-error mt-2 text-sm text-[#EB5757]" { (message) }
        }
    }
}

fn empty_state() -> Markup {
    html! {
        div class="empty-state min-h-screen flex flex-col items-center justify-center px-6 text-center" {
            h2 class="text-3xl md:text-5xl font-semibold mb-10" { "Your movie list is empty" }
            a class="px-7 py-4 bg-[#2BD17E] rounded-lg font-semibold" href=(Navigation::Create.path()) { "Add a new movie" }
        }
    }
}

fn movie_card(movie: &Movie) -> Markup {
    html! {
        a class="movie-card block rounded-xl bg-[#092C39] p-2 hover:scale-105 transition" href=(Navigation::Edit(movie.id.clone()).path()) {
            @if let Some(poster) = &movie.poster {
                img class="h-[300px] w-full rounded-lg object-cover" src=(poster) alt=(movie.title);
            } @else {
                div class="h-[300px] w-full rounded-lg bg-[#224957]" {}
            }
            div class="px-2 py-4" {
                h3 class="text-lg font-medium" { (movie.title) }
                p class="text-sm" { (movie.year) }
            }
        }
    }
}

fn pagination_controls(pagination: &Pagination) -> Markup {
    let go = |n: usize| format!("$page = {n}");
    let current = pagination.current_page();
    let (mut prev, mut next) = (*pagination, *pagination);
    prev.prev();
    next.next();

    html! {
        nav class="pagination mt-12 flex items-center justify-center gap-2" {
            button type="button" class="prev px-3 py-1 font-bold disabled:opacity-50" data-on:click=(go(prev.current_page())) disabled[!pagination.has_prev()] { "Prev" }
            @for n in 1..=pagination.total_pages() {
                @if n == current {
                    button type="button" class="page current rounded px-3 py-1 bg-[#2BD17E] text-black" aria-current="page" { (n) }
                } @else {
                    button type="button" class="page rounded px-3 py-1 bg-[#224957] hover:bg-[#2BD17E]" data-on:click=(go(n)) { (n) }
                }
            }
            button type="button" class="next px-3 py-1 font-bold disabled:opacity-50" data-on:click=(go(next.current_page())) disabled[!pagination.has_next()] { "Next" }
        }
    }
}
