//! Incremental resampling of ticks and bars into coarser bars.

use chrono::{DateTime, Datelike, DurationRound, NaiveTime, TimeDelta, Utc};
use dukastream_types::{Bar, PriceType, Record, Tick, Timeframe};

/// Streaming resampler.
///
/// Folds ticks or finer bars into bars of the configured timeframe. Input
/// must be time-ordered; a bar is emitted when the first record of the next
/// bucket arrives, and the last open bar is taken by [`flush`].
///
/// [`flush`]: Resampler::flush
#[derive(Debug)]
pub struct Resampler {
    timeframe: Timeframe,
    price: PriceType,
    current_bar: Option<BarBuilder>,
}

impl Resampler {
    /// Creates a resampler for the given timeframe. `price` selects which
    /// quote of a tick becomes the bar price.
    #[must_use]
    pub const fn new(timeframe: Timeframe, price: PriceType) -> Self {
        Self {
            timeframe,
            price,
            current_bar: None,
        }
    }

    /// Processes a record, possibly completing the previous bar.
    pub fn process(&mut self, record: Record) -> Option<Bar> {
        let piece = match record {
            Record::Tick(tick) => self.tick_as_bar(&tick),
            Record::Bar(bar) => bar,
        };
        self.push(piece)
    }

    /// Takes the open bar out, leaving the resampler empty.
    pub fn flush(&mut self) -> Option<Bar> {
        self.current_bar.take().map(BarBuilder::finish)
    }

    fn push(&mut self, piece: Bar) -> Option<Bar> {
        let bucket = bucket_start(self.timeframe, piece.timestamp);

        match self.current_bar.take() {
            Some(mut builder) if builder.timestamp == bucket => {
                builder.update(&piece);
                self.current_bar = Some(builder);
                None
            }
            Some(builder) => {
                self.current_bar = Some(BarBuilder::new(bucket, &piece));
                Some(builder.finish())
            }
            None => {
                self.current_bar = Some(BarBuilder::new(bucket, &piece));
                None
            }
        }
    }

    fn tick_as_bar(&self, tick: &Tick) -> Bar {
        let (price, volume) = match self.price {
            PriceType::Bid => (tick.bid, tick.bid_volume),
            PriceType::Ask => (tick.ask, tick.ask_volume),
            PriceType::Mid => (tick.mid(), tick.total_volume()),
        };
        Bar::new(tick.timestamp, price, price, price, price, volume)
    }
}

/// Open bar being accumulated.
#[derive(Debug)]
struct BarBuilder {
    timestamp: DateTime<Utc>,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

impl BarBuilder {
    const fn new(timestamp: DateTime<Utc>, first: &Bar) -> Self {
        Self {
            timestamp,
            open: first.open,
            high: first.high,
            low: first.low,
            close: first.close,
            volume: first.volume,
        }
    }

    fn update(&mut self, piece: &Bar) {
        self.high = self.high.max(piece.high);
        self.low = self.low.min(piece.low);
        self.close = piece.close;
        self.volume += piece.volume;
    }

    const fn finish(self) -> Bar {
        Bar::new(
            self.timestamp,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
        )
    }
}

/// Returns the start of the `timeframe` bucket containing `timestamp`.
///
/// Fixed-length buckets are aligned to the Unix epoch, so hour and day
/// buckets start on UTC hour and midnight boundaries. Month buckets start
/// on the first of the calendar month.
#[must_use]
pub fn bucket_start(timeframe: Timeframe, timestamp: DateTime<Utc>) -> DateTime<Utc> {
    match timeframe {
        Timeframe::Tick => timestamp,
        Timeframe::Month1 => truncate_to_month(timestamp),
        _ => timeframe
            .seconds()
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(|secs| timestamp.duration_trunc(TimeDelta::seconds(secs)).ok())
            .unwrap_or(timestamp),
    }
}

/// Truncates a timestamp to the first of its month.
fn truncate_to_month(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.date_naive()
        .with_day(1)
        .map_or(dt, |first| first.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Timelike};

    fn make_tick(hour: u32, minute: u32, second: u32, millis: u32, ask: f64, bid: f64) -> Tick {
        let timestamp = Utc
            .with_ymd_and_hms(2024, 1, 1, hour, minute, second)
            .unwrap()
            + TimeDelta::milliseconds(i64::from(millis));
        Tick::new(timestamp, ask, bid, 100.0, 50.0)
    }

    fn bar_at(day: u32, hour: u32, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let t = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        Bar::new(t, open, high, low, close, 10.0)
    }

    #[test]
    fn test_minute_bars_from_bid_ticks() {
        let mut agg = Resampler::new(Timeframe::Minute1, PriceType::Bid);

        assert!(agg.process(Record::Tick(make_tick(12, 0, 0, 0, 1.1001, 1.1000))).is_none());
        assert!(agg.process(Record::Tick(make_tick(12, 0, 30, 0, 1.1010, 1.1005))).is_none());
        let bar = agg
            .process(Record::Tick(make_tick(12, 1, 0, 0, 1.0990, 1.0985)))
            .unwrap();

        assert_eq!(bar.timestamp.minute(), 0);
        assert_relative_eq!(bar.open, 1.1000, epsilon = 1e-10);
        assert_relative_eq!(bar.high, 1.1005, epsilon = 1e-10);
        assert_relative_eq!(bar.close, 1.1005, epsilon = 1e-10);
        assert_relative_eq!(bar.volume, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_mid_ticks_use_total_volume() {
        let mut agg = Resampler::new(Timeframe::Hour1, PriceType::Mid);
        agg.process(Record::Tick(make_tick(12, 0, 0, 0, 1.1001, 1.1000)));

        let bar = agg.flush().unwrap();
        assert_relative_eq!(bar.open, 1.10005, epsilon = 1e-10);
        assert_relative_eq!(bar.volume, 150.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ask_ticks() {
        let mut agg = Resampler::new(Timeframe::Second1, PriceType::Ask);
        agg.process(Record::Tick(make_tick(12, 0, 0, 100, 1.2, 1.1)));
        agg.process(Record::Tick(make_tick(12, 0, 0, 900, 1.3, 1.0)));

        let bar = agg.flush().unwrap();
        assert_eq!(bar.timestamp.nanosecond(), 0);
        assert_relative_eq!(bar.low, 1.2, epsilon = 1e-10);
        assert_relative_eq!(bar.high, 1.3, epsilon = 1e-10);
    }

    #[test]
    fn test_hours_into_day() {
        let mut agg = Resampler::new(Timeframe::Day1, PriceType::Bid);

        assert!(agg.process(Record::Bar(bar_at(2, 0, 1.0, 1.5, 0.9, 1.2))).is_none());
        assert!(agg.process(Record::Bar(bar_at(2, 1, 1.2, 1.8, 1.1, 1.3))).is_none());
        let day = agg.process(Record::Bar(bar_at(3, 0, 1.3, 1.4, 1.2, 1.25))).unwrap();

        assert_eq!(day.timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_relative_eq!(day.open, 1.0, epsilon = 1e-10);
        assert_relative_eq!(day.high, 1.8, epsilon = 1e-10);
        assert_relative_eq!(day.low, 0.9, epsilon = 1e-10);
        assert_relative_eq!(day.close, 1.3, epsilon = 1e-10);
        assert_relative_eq!(day.volume, 20.0, epsilon = 1e-10);
    }

    #[test]
    fn test_four_hour_buckets() {
        let mut agg = Resampler::new(Timeframe::Hour4, PriceType::Bid);
        agg.process(Record::Bar(bar_at(2, 5, 1.0, 1.0, 1.0, 1.0)));
        agg.process(Record::Bar(bar_at(2, 7, 1.0, 1.0, 1.0, 1.0)));
        let bar = agg.process(Record::Bar(bar_at(2, 8, 1.0, 1.0, 1.0, 1.0))).unwrap();
        assert_eq!(bar.timestamp.hour(), 4);
    }

    #[test]
    fn test_flush_resets() {
        let mut agg = Resampler::new(Timeframe::Hour1, PriceType::Bid);
        agg.process(Record::Bar(bar_at(2, 5, 1.0, 1.0, 1.0, 1.0)));
        assert!(agg.flush().is_some());
        assert!(agg.flush().is_none());
    }

    #[test]
    fn test_bucket_start() {
        let dt = Utc.with_ymd_and_hms(2024, 2, 15, 14, 37, 45).unwrap();

        assert_eq!(bucket_start(Timeframe::Minute5, dt).minute(), 35);
        assert_eq!(bucket_start(Timeframe::Minute15, dt).minute(), 30);
        assert_eq!(bucket_start(Timeframe::Hour4, dt).hour(), 12);
        assert_eq!(bucket_start(Timeframe::Day1, dt).hour(), 0);
        assert_eq!(
            bucket_start(Timeframe::Month1, dt),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(bucket_start(Timeframe::Tick, dt), dt);
    }
}
