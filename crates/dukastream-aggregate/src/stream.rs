//! Resampling adapter over record streams.

use dukastream_types::{Error, PriceType, Record, Timeframe};
use futures::stream::{self, Stream, StreamExt};

use crate::Resampler;

struct State<S> {
    input: S,
    resampler: Resampler,
    done: bool,
}

/// Resamples a time-ordered record stream into bars of `timeframe`.
///
/// Bars are emitted as soon as the next bucket starts; the last bar when the
/// input ends. An input error is passed through and ends the stream. A
/// `tick` target returns the input unchanged.
pub fn resample<S>(
    input: S,
    timeframe: Timeframe,
    price: PriceType,
) -> impl Stream<Item = Result<Record, Error>>
where
    S: Stream<Item = Result<Record, Error>> + Unpin,
{
    if timeframe.is_tick() {
        return input.left_stream();
    }

    let state = State {
        input,
        resampler: Resampler::new(timeframe, price),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }
        loop {
            match state.input.next().await {
                Some(Ok(record)) => {
                    if let Some(bar) = state.resampler.process(record) {
                        return Some((Ok(Record::Bar(bar)), state));
                    }
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    return state
                        .resampler
                        .flush()
                        .map(|bar| (Ok(Record::Bar(bar)), state));
                }
            }
        }
    })
    .right_stream()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use dukastream_types::{Bar, Tick};

    fn minute_bars(count: i64) -> Vec<Result<Record, Error>> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..count)
            .map(|i| {
                let t = start + TimeDelta::minutes(i * 20);
                Ok(Record::Bar(Bar::new(t, 1.0, 2.0, 0.5, 1.5, 1.0)))
            })
            .collect()
    }

    #[tokio::test]
    async fn test_minutes_into_hours() {
        let out: Vec<_> = resample(
            stream::iter(minute_bars(7)),
            Timeframe::Hour1,
            PriceType::Bid,
        )
        .collect()
        .await;

        assert_eq!(out.len(), 3);
        let volumes: Vec<f64> = out
            .iter()
            .map(|r| r.as_ref().unwrap().as_bar().unwrap().volume)
            .collect();
        assert_eq!(volumes, vec![3.0, 3.0, 1.0]);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let mut input = minute_bars(4);
        input.insert(2, Err(Error::Http { status: 500 }));

        let out: Vec<_> = resample(stream::iter(input), Timeframe::Hour1, PriceType::Bid)
            .collect()
            .await;

        assert_eq!(out.len(), 1);
        assert!(matches!(out[0], Err(Error::Http { status: 500 })));
    }

    #[tokio::test]
    async fn test_tick_target_passes_through() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let ticks = vec![Ok(Record::Tick(Tick::new(t, 1.1, 1.0, 1.0, 1.0)))];
        let out: Vec<_> = resample(stream::iter(ticks), Timeframe::Tick, PriceType::Bid)
            .collect()
            .await;
        assert!(out[0].as_ref().unwrap().as_tick().is_some());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let out: Vec<_> = resample(
            stream::iter(Vec::<Result<Record, Error>>::new()),
            Timeframe::Day1,
            PriceType::Bid,
        )
        .collect()
        .await;
        assert!(out.is_empty());
    }
}
