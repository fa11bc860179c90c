// Copyright 2022 Datafuse Labs.
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

use common_datablocks::Block;
use common_datablocks::Page;
use common_exception::Result;
use common_pipeline::Driver;
use common_pipeline::Operator;
use pretty_assertions::assert_eq;
use qcore::AggregatorMode;
use qcore::GroupingAggregator;
use qcore::GroupingAggregatorConfig;
use qcore::MaxFn;

/// Emits one fixed page, then finishes — a stand-in for a source
/// operator in tests that only care about what's downstream of it.
struct StaticPageSource {
    page: Option<Page>,
}

impl Operator for StaticPageSource {
    fn name(&self) -> &'static str {
        "static_page_source"
    }

    fn is_finished(&self) -> bool {
        self.page.is_none()
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        Ok(self.page.take())
    }
}

#[test]
fn test_grouping_max_through_the_driver() -> Result<()> {
    let page = Page::try_create(vec![
        Block::Long(vec![0, 1, 0, 1, 2]),
        Block::Double(vec![10.0, 20.0, 30.0, 5.0, 7.0]),
    ])?;

    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(StaticPageSource { page: Some(page) }),
        Box::new(GroupingAggregator::<MaxFn>::create(GroupingAggregatorConfig::new(
            0,
            1,
            AggregatorMode::RawToFinal,
        ))),
    ];

    let mut driver = Driver::create(operators);
    let pages = driver.run_to_completion()?;
    assert_eq!(pages.len(), 1);

    let out = pages[0].get_block(0)?;
    assert_eq!(out.get_double(0)?, 30.0);
    assert_eq!(out.get_double(1)?, 20.0);
    assert_eq!(out.get_double(2)?, 7.0);
    Ok(())
}
