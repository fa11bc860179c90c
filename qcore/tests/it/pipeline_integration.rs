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

//! End-to-end driver runs gluing a plain streaming source to the
//! aggregator and top-N operators, exercising the reverse-polling
//! driver loop against qcore's own `Operator` impls rather than each
//! operator in isolation.

use common_datablocks::Block;
use common_datablocks::Page;
use common_exception::Result;
use common_pipeline::Driver;
use common_pipeline::Operator;
use pretty_assertions::assert_eq;
use qcore::AggregatorMode;
use qcore::ScalarAggregator;
use qcore::ScalarAggregatorConfig;
use qcore::TopNConfig;
use qcore::TopNOperator;

/// Emits `pages`, one per `get_output` call, then finishes.
struct QueueSource {
    pages: std::collections::VecDeque<Page>,
}

impl Operator for QueueSource {
    fn name(&self) -> &'static str {
        "queue_source"
    }

    fn is_finished(&self) -> bool {
        self.pages.is_empty()
    }

    fn get_output(&mut self) -> Result<Option<Page>> {
        Ok(self.pages.pop_front())
    }
}

#[test]
fn test_max_aggregator_through_the_driver() -> Result<()> {
    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(QueueSource {
            pages: vec![
                Page::try_create(vec![Block::Double(vec![1.0, 5.0, 2.0])])?,
                Page::try_create(vec![Block::Double(vec![3.0, 4.0])])?,
            ]
            .into(),
        }),
        Box::new(ScalarAggregator::<qcore::aggregate::MaxFn>::create(
            ScalarAggregatorConfig::new(0, AggregatorMode::RawToFinal),
        )),
    ];

    let mut driver = Driver::create(operators);
    let pages = driver.run_to_completion()?;
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].get_block(0)?.get_double(0)?, 5.0);
    Ok(())
}

#[test]
fn test_top_n_through_the_driver() -> Result<()> {
    let operators: Vec<Box<dyn Operator>> = vec![
        Box::new(QueueSource {
            pages: vec![Page::try_create(vec![Block::Long(vec![
                4, 1, 9, 2, 7, 7, 3,
            ])])?]
            .into(),
        }),
        Box::new(TopNOperator::create(TopNConfig::new(0, false, 3))?),
    ];

    let mut driver = Driver::create(operators);
    let pages = driver.run_to_completion()?;

    let mut values: Vec<i64> = pages
        .iter()
        .map(|p| p.get_block(0).unwrap().get_long(0).unwrap())
        .collect();
    values.sort_unstable();
    assert_eq!(values, vec![7, 7, 9]);
    Ok(())
}
