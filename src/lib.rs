/*!

A low level, performance orientated parser for the [InfluxDB line
protocol](https://docs.influxdata.com/influxdb/v1/write_protocols/line_protocol_tutorial/).

## Features

- ✔ Lazy: points are decoded one at a time as they are pulled
- ✔ Tolerant: a malformed line is dropped and decoding carries on
- ✔ Small: a tiny dependency footprint
- ✔ Round trip: decoded points re-serialize to protocol compliant lines

## Quick Start

```rust
use fluxline::{FieldValue, LineProtocolParser};

let data = "# temperature readings\n\
            weather,location=us-midwest temperature=82 1465839830100400200\n\
            weather,location=us-midwest temperature=83 1465839830101400200";

let mut parser = LineProtocolParser::new(data);
while parser.has_next() {
    let point = parser.next_point()?;
    assert_eq!(point.measurement(), "weather");
    assert_eq!(point.tag("location"), Some("us-midwest"));
    assert!(matches!(
        point.field("temperature"),
        Some(FieldValue::Float(_))
    ));
}
# Ok::<(), fluxline::Error>(())
```

## Strict decoding

By default, content that trails the closing quote of a string field is
discarded and the rest of the point survives. Strict mode drops such lines
outright:

```rust
use fluxline::LineProtocolParser;

let data = "weather temperature=\"82\"F 1465839830100400200";

assert_eq!(LineProtocolParser::new(data).count(), 1);
let strict = LineProtocolParser::builder().strict(true).build(data);
assert_eq!(strict.count(), 0);
```

## Writing points back out

A [`Point`] displays as its canonical line protocol serialization, and can
be constructed programmatically:

```rust
use fluxline::Point;

let point = Point::builder("weather")
    .tag("location", "us-midwest")
    .field("temperature", 82.0)
    .timestamp(1465839830100400200)
    .build()?;

assert_eq!(
    point.to_string(),
    "weather,location=us-midwest temperature=82 1465839830100400200"
);
# Ok::<(), fluxline::Error>(())
```

*/

mod errors;
mod parser;
mod point;
pub(crate) mod scan;
mod value;

pub use self::errors::{Error, ErrorKind};
pub use self::parser::{LineProtocolParser, LineProtocolParserBuilder};
pub use self::point::{Point, PointBuilder};
pub use self::value::{FieldValue, ValueError};
