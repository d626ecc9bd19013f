//! Adapters — concrete implementations of the port traits.
//!
//! | Adapter    | Implements     | Connects to                       |
//! |------------|----------------|-----------------------------------|
//! | `thermal`  | SensorPort     | /sys/class/thermal zone file      |
//! | `pwm`      | ActuatorPort   | /sys/class/pwm chip/channel       |
//! | `fifo`     | (listener I/O) | named pipe for manual commands    |
//! | `log_sink` | EventSink      | stderr via the `log` facade       |

pub mod fifo;
pub mod log_sink;
pub mod pwm;
pub mod thermal;
