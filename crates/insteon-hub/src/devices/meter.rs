//! Energy meters.

use insteon_protocol::{CMD_LIGHT_OFF, CMD_LIGHT_ON, CMD_METER_STATUS};

use super::DeviceHandler;
use crate::event::DeviceEventKind;

/// Energy meter. It announces that consumption changed; reading it is a
/// separate status request.
#[derive(Debug, Default)]
pub struct Meter;

impl DeviceHandler for Meter {
    fn handle_direct(&mut self, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        (cmd1 == CMD_METER_STATUS).then_some(DeviceEventKind::ReportRequested)
    }

    fn handle_all_link_broadcast(&mut self, _group: u8, cmd1: u8, _cmd2: u8) -> Option<DeviceEventKind> {
        matches!(cmd1, CMD_LIGHT_ON | CMD_LIGHT_OFF).then_some(DeviceEventKind::ReportRequested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_requests_report() {
        let mut meter = Meter;
        assert_eq!(meter.handle_direct(0x82, 0), Some(DeviceEventKind::ReportRequested));
        assert_eq!(meter.handle_all_link_broadcast(1, 0x11, 0), Some(DeviceEventKind::ReportRequested));
        assert_eq!(meter.handle_all_link_broadcast(1, 0x17, 0), None);
    }
}
