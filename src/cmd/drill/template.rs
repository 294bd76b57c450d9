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

use maud::DOCTYPE;
use maud::Markup;
use maud::html;

/// Timing hints read by `script.js`.
#[derive(Default)]
pub struct PageTimers {
    /// Reload the page after this many milliseconds.
    pub reload_ms: Option<u64>,
    /// Seconds left in a speed round, counted down on the page.
    pub countdown_secs: Option<u32>,
}

pub fn page_template(timers: PageTimers, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "namedrill" }
                link rel="stylesheet" href="/style.css";
            }
            body
                data-reload-ms=[timers.reload_ms]
                data-countdown-secs=[timers.countdown_secs]
            {
                (body)
                script src="/script.js" {};
            }
        }
    }
}
