// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Main-loop tasks.
//!
//! [`SonarApp::poll`] runs the host protocol, the platform protocol and the ranging task once
//! each. Nothing in here waits on hardware: every step works with whatever bytes and engine state
//! are available and returns.

use crate::config::Config;
use crate::error::{ConfigError, ScanError};
use crate::protocol::messages::PLATFORM_MODE_MANUAL;
use crate::protocol::{
    ArrayMode, Console, HostCommand, HostParser, OutputMode, PlatformCommand, PlatformEvent,
    PlatformProtocol, PlatformResponse, Position, TelemetryFrame,
};
use crate::ranging::{Acquisition, Completed, ScanMode, ScanState, SensorSet, TriggerSettings};
use crate::transport::{relay, send_all_bounded, ByteChannel};

/// What the array should scan next, as configured by the host.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    enabled: bool,
    mode: ScanMode,
    selected: u8,
    sensor_count: u8,
    active: SensorSet,
    output: OutputMode,
}

impl ScanPlan {
    /// Scanning the whole array with telemetry off.
    pub fn new(sensor_count: u8) -> Self {
        let mut plan = Self {
            enabled: true,
            mode: ScanMode::Complete,
            selected: 0,
            sensor_count,
            active: SensorSet::new(),
            output: OutputMode::None,
        };
        plan.set_mode(ArrayMode::Complete);
        plan
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    #[inline]
    pub fn selected(&self) -> u8 {
        self.selected
    }

    #[inline]
    pub fn active(&self) -> &[u8] {
        &self.active
    }

    #[inline]
    pub fn output(&self) -> OutputMode {
        self.output
    }

    #[inline]
    pub fn set_output(&mut self, output: OutputMode) {
        self.output = output;
    }

    /// Disabling keeps the sensor set so re-enabling resumes it.
    pub fn set_mode(&mut self, mode: ArrayMode) {
        match mode {
            ArrayMode::Disabled => self.enabled = false,
            ArrayMode::Single => {
                self.mode = ScanMode::Single;
                self.active.clear();
                let _ = self.active.push(self.selected);
                self.enabled = true;
            }
            ArrayMode::Complete => {
                self.mode = ScanMode::Complete;
                self.active.clear();
                for s in 0..self.sensor_count {
                    let _ = self.active.push(s);
                }
                self.enabled = true;
            }
        }
    }

    /// Select the sensor used by single mode. Takes effect on the next scan.
    pub fn select(&mut self, sensor: u8) -> Result<(), ScanError> {
        if sensor >= self.sensor_count {
            return Err(ScanError::InvalidSensor(sensor));
        }
        self.selected = sensor;
        if self.mode == ScanMode::Single {
            self.active.clear();
            let _ = self.active.push(sensor);
        }
        Ok(())
    }

    fn should_scan(&self) -> bool {
        self.enabled && !self.active.is_empty()
    }
}

pub struct SonarApp {
    config: Config,
    console: Console,
    host: HostParser,
    platform: PlatformProtocol,
    plan: ScanPlan,
    telemetry: Option<TelemetryFrame>,
    passthrough: bool,
    uptime_ms: u32,
    next_temperature_ms: u32,
    temperature_deadline_ms: u32,
    scan_faults: u32,
    rx_overflows: u32,
    position: Position,
    last_button: Option<u8>,
}

impl SonarApp {
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            console: Console::new(config.tx_retry_limit),
            host: HostParser::new(),
            platform: PlatformProtocol::new(),
            plan: ScanPlan::new(config.sensor_count),
            telemetry: None,
            passthrough: false,
            uptime_ms: 0,
            next_temperature_ms: 0,
            temperature_deadline_ms: 0,
            scan_faults: 0,
            rx_overflows: 0,
            position: Position::default(),
            last_button: None,
            config,
        })
    }

    #[inline]
    pub fn plan(&self) -> &ScanPlan {
        &self.plan
    }

    #[inline]
    pub fn console(&self) -> &Console {
        &self.console
    }

    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.passthrough
    }

    #[inline]
    pub fn uptime_ms(&self) -> u32 {
        self.uptime_ms
    }

    /// Scans abandoned after a timing fault.
    #[inline]
    pub fn scan_faults(&self) -> u32 {
        self.scan_faults
    }

    /// Receive overflows reported on either link.
    #[inline]
    pub fn rx_overflows(&self) -> u32 {
        self.rx_overflows
    }

    /// Last position reported by the platform.
    #[inline]
    pub fn position(&self) -> Position {
        self.position
    }

    #[inline]
    pub fn last_button(&self) -> Option<u8> {
        self.last_button
    }

    /// 1 ms system tick.
    #[inline]
    pub fn on_tick(&mut self) {
        self.uptime_ms = self.uptime_ms.wrapping_add(1);
    }

    /// Put the platform into manual mode and announce readiness to the host.
    pub fn boot<H, P>(&mut self, host: &mut H, platform: &mut P)
    where
        H: ByteChannel + ?Sized,
        P: ByteChannel + ?Sized,
    {
        let retries = self.config.tx_retry_limit;
        for cmd in [
            PlatformCommand::Beep,
            PlatformCommand::SetMode(PLATFORM_MODE_MANUAL),
        ] {
            if let Err(_e) = PlatformProtocol::send(platform, cmd, retries) {
                warn!("platform bring-up command {} failed: {}", cmd, _e);
            }
        }
        let _ = self.console.text(host).str("Ready!").finish();
        info!("sonar array ready");
    }

    /// One pass of every main-loop task.
    pub fn poll<H, P, A, const N: usize>(&mut self, host: &mut H, platform: &mut P, acq: &mut A)
    where
        H: ByteChannel + ?Sized,
        P: ByteChannel + ?Sized,
        A: Acquisition<N>,
    {
        if self.passthrough {
            relay(host, platform);
            relay(platform, host);
            return;
        }

        // Nothing else may write to the host until the frame is fully queued.
        if !self.pump_telemetry(host, acq) {
            return;
        }

        self.report_rx_overflow(host, platform);
        if let Some(cmd) = self.host.poll(host) {
            self.handle_host(cmd, host, platform, acq);
            if self.passthrough {
                return;
            }
        }
        self.poll_platform(host, platform);
        self.run_ranging(host, acq);
    }

    fn handle_host<H, P, A, const N: usize>(
        &mut self,
        cmd: HostCommand,
        host: &mut H,
        platform: &mut P,
        acq: &mut A,
    ) where
        H: ByteChannel + ?Sized,
        P: ByteChannel + ?Sized,
        A: Acquisition<N>,
    {
        let console = self.console;
        match cmd {
            HostCommand::SetDebug(true) => {
                self.console.set_enabled(true);
                self.console.message(host, "DEBUG ENABLED");
            }
            HostCommand::SetDebug(false) => {
                console.message(host, "DEBUG DISABLED");
                self.console.set_enabled(false);
            }
            HostCommand::SetScanMode(b) => {
                let msg = match ArrayMode::from_byte(b) {
                    Some(mode) => {
                        self.plan.set_mode(mode);
                        match mode {
                            ArrayMode::Disabled => "US MODE - DISABLED",
                            ArrayMode::Single => "US MODE - SINGLE",
                            ArrayMode::Complete => "US MODE - COMPLETE",
                        }
                    }
                    None => "US MODE - NOT RECOGNISED!",
                };
                console.message(host, msg);
            }
            HostCommand::SelectSensor(sensor) => match self.plan.select(sensor) {
                Ok(()) => {
                    if let Some(line) = console.debug(host) {
                        let _ = line.str("US SENSOR SELECT - ").int(sensor).finish();
                    }
                }
                Err(_) => console.message(host, "US SENSOR SELECT - NOT RECOGNISED!"),
            },
            HostCommand::SetTriggers(settings) => {
                acq.with_engine(|engine, _| engine.set_triggers(settings));
                self.report_triggers(host, &settings);
            }
            HostCommand::SetOutput(b) => {
                let msg = match OutputMode::from_byte(b) {
                    Some(output) => {
                        self.plan.set_output(output);
                        match output {
                            OutputMode::None => "US OUTPUT - DISABLED",
                            OutputMode::Waveform => "US OUTPUT - WAVEFORM",
                            OutputMode::Range => "US OUTPUT - RANGE",
                        }
                    }
                    None => "US OUTPUT - NOT RECOGNISED!",
                };
                console.message(host, msg);
            }
            HostCommand::RobotCommand(payload) => {
                if let Err(_e) = send_all_bounded(platform, &payload, self.config.tx_retry_limit)
                {
                    warn!("robot command relay failed: {}", _e);
                }
                console.message(host, "ROBOT CMD ISSUED");
            }
            HostCommand::Ping => console.message(host, "PING!"),
            HostCommand::Passthrough => {
                console.message(host, "ENTERING 3PI PASSTHROUGH MODE...");
                acq.with_engine(|engine, hw| engine.reset(hw));
                self.passthrough = true;
                info!("entering platform passthrough");
            }
            HostCommand::Unrecognized(_code) => {
                warn!("unrecognised host command {=u8:#x}", _code);
                console.message(host, "ERROR CMD NOT RECOGNISED!");
            }
        }
    }

    fn report_triggers<H: ByteChannel + ?Sized>(&self, host: &mut H, t: &TriggerSettings) {
        if let Some(line) = self.console.debug(host) {
            let _ = line
                .str("US TRIGGER SET - CHANGEOVER: ")
                .int(t.changeover_us)
                .str(", NL: ")
                .int(t.near_lower_cv)
                .str(", NU: ")
                .int(t.near_upper_cv)
                .str(", FL: ")
                .int(t.far_lower_cv)
                .str(", FU: ")
                .int(t.far_upper_cv)
                .finish();
        }
    }

    fn report_rx_overflow<H, P>(&mut self, host: &mut H, platform: &mut P)
    where
        H: ByteChannel + ?Sized,
        P: ByteChannel + ?Sized,
    {
        if host.take_rx_overflow() {
            let dropped = host.rx_dropped();
            self.overflow_report(host, "HOST", dropped);
        }
        if platform.take_rx_overflow() {
            let dropped = platform.rx_dropped();
            self.overflow_report(host, "3PI", dropped);
        }
    }

    fn overflow_report<H: ByteChannel + ?Sized>(&mut self, host: &mut H, link: &str, dropped: u32) {
        self.rx_overflows = self.rx_overflows.wrapping_add(1);
        warn!("{=str} rx overflow, {=u32} bytes dropped", link, dropped);
        if let Some(line) = self.console.debug(host) {
            let _ = line
                .str(link)
                .str(" RX OVERFLOW - DROPPED: ")
                .int(dropped)
                .finish();
        }
    }

    fn poll_platform<H, P>(&mut self, host: &mut H, platform: &mut P)
    where
        H: ByteChannel + ?Sized,
        P: ByteChannel + ?Sized,
    {
        let console = self.console;
        let Some(event) = self.platform.poll(platform) else {
            return;
        };
        match event {
            PlatformEvent::DebugLine(text) => {
                if console.is_enabled() {
                    let _ = console.text(host).str("3PI: ").bytes(text).finish();
                }
            }
            PlatformEvent::Response(PlatformResponse::Ok) => console.message(host, "3PI CMD OK"),
            PlatformEvent::Response(PlatformResponse::Error) => {
                console.message(host, "3PI CMD ERROR")
            }
            PlatformEvent::Response(PlatformResponse::Position(pos)) => {
                self.position = pos;
                if let Some(line) = console.debug(host) {
                    let _ = line
                        .str("3PI POS UPDATE: ")
                        .int(pos.x)
                        .str(",")
                        .int(pos.y)
                        .str(",")
                        .int(pos.theta)
                        .finish();
                }
            }
            PlatformEvent::Response(PlatformResponse::Button(code)) => {
                self.last_button = Some(code);
                if let Some(line) = console.debug(host) {
                    let _ = line.str("3PI BTN PRESS: ").int(code).finish();
                }
            }
        }
    }

    fn run_ranging<H, A, const N: usize>(&mut self, host: &mut H, acq: &mut A)
    where
        H: ByteChannel + ?Sized,
        A: Acquisition<N>,
    {
        let mut state = acq.with_engine(|engine, _| engine.state());
        if state == ScanState::Temp && self.reached(self.temperature_deadline_ms) {
            state = acq.with_engine(|engine, _| {
                engine.time_out_temperature();
                engine.state()
            });
        }
        match state {
            ScanState::Idle => self.start_next(acq),
            ScanState::Complete => self.collect(acq),
            s if s.is_fault() => {
                self.scan_faults = self.scan_faults.wrapping_add(1);
                warn!("scan fault in state {}", s);
                if let Some(line) = self.console.debug(host) {
                    let _ = line.str("US SCAN FAULT - ").str(s.as_str()).finish();
                }
                acq.with_engine(|engine, hw| engine.reset(hw));
            }
            _ => {}
        }
    }

    /// Queue as much of the pending frame as fits. Returns `true` once no frame is pending.
    fn pump_telemetry<H, A, const N: usize>(&mut self, host: &mut H, acq: &mut A) -> bool
    where
        H: ByteChannel + ?Sized,
        A: Acquisition<N>,
    {
        let Some(frame) = self.telemetry.as_mut() else {
            return true;
        };
        // A new scan would overwrite the waveforms still being streamed.
        if !acq.with_engine(|engine, _| frame.pump(engine, &mut *host)) {
            return false;
        }
        self.telemetry = None;
        true
    }

    fn start_next<A: Acquisition<N>, const N: usize>(&mut self, acq: &mut A) {
        if self.temperature_due() {
            match acq.with_engine(|engine, hw| engine.start_temperature(hw)) {
                Ok(()) => {
                    self.next_temperature_ms = self
                        .uptime_ms
                        .wrapping_add(self.config.temperature_refresh_ms);
                    self.temperature_deadline_ms = self
                        .uptime_ms
                        .wrapping_add(self.config.temperature_timeout_ms);
                }
                Err(_e) => warn!("temperature read not started: {}", _e),
            }
            return;
        }

        if !self.plan.should_scan() {
            return;
        }
        let mode = self.plan.mode;
        let sensors = &self.plan.active;
        if let Err(_e) = acq.with_engine(|engine, hw| engine.start_scan(mode, sensors, hw)) {
            warn!("scan not started: {}", _e);
        }
    }

    fn collect<A: Acquisition<N>, const N: usize>(&mut self, acq: &mut A) {
        let output = self.plan.output;
        let result = acq.with_engine(|engine, _| {
            engine.finish().map(|done| {
                let frame = match done {
                    Completed::Scan => {
                        TelemetryFrame::new::<N>(output, engine.session().sensors())
                    }
                    Completed::Temperature(_) => None,
                };
                (done, frame)
            })
        });
        match result {
            Ok((Completed::Temperature(_t), _)) => debug!("air temperature {=i16} dC", _t),
            Ok((Completed::Scan, frame)) => self.telemetry = frame,
            Err(_e) => warn!("collect failed: {}", _e),
        }
    }

    fn temperature_due(&self) -> bool {
        self.reached(self.next_temperature_ms)
    }

    /// `true` once the tick counter has passed `deadline_ms`, across wraparound.
    fn reached(&self, deadline_ms: u32) -> bool {
        self.uptime_ms.wrapping_sub(deadline_ms) as i32 >= 0
    }
}
