// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use pulldown_cmark::Event;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use pulldown_cmark::html::push_html;

/// Render an item's notes. Raw HTML is shown as text and images are dropped,
/// since the only picture on the page should be the item's photo.
pub fn notes_to_html(markdown: &str) -> String {
    let parser = Parser::new(markdown);
    let mut in_image = false;
    let events = parser.filter_map(|event| match event {
        Event::Html(text) | Event::InlineHtml(text) => Some(Event::Text(text)),
        Event::Start(Tag::Image { .. }) => {
            in_image = true;
            None
        }
        Event::End(TagEnd::Image) => {
            in_image = false;
            None
        }
        _ if in_image => None,
        _ => Some(event),
    });
    let mut html_output: String = String::new();
    push_html(&mut html_output, events);
    html_output
}

/// Like [`notes_to_html`], but without the wrapping paragraph for one-line
/// notes.
pub fn notes_to_html_inline(markdown: &str) -> String {
    let text = notes_to_html(markdown);
    if text.starts_with("<p>") && text.ends_with("</p>\n") && text.matches("<p>").count() == 1 {
        let len = text.len();
        text[3..len - 5].to_string()
    } else {
        text
    }
}
