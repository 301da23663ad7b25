// libportal/src/test_support.rs

//! Test support helpers intended for use by unit and integration tests.
//!
//! Both simulators hand out [`MockTransport`]s whose responder answers like
//! the real hardware, while the simulator keeps a shared handle on the
//! hardware state so tests can change the field or inspect what was written
//! after the transport moved onto a polling thread.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::constants::{PAGE_SIZE, SELECT_CODES, TOKEN_SIZE};
use crate::device::models::n2elite::config as n2;
use crate::device::models::powersaves::config as ps;
use crate::protocol::{FILLER, append_crc_a, strip_crc_a};
use crate::transport::MockTransport;

/// Deterministic token image used across tests
#[doc(hidden)]
pub fn sample_token() -> [u8; TOKEN_SIZE] {
    let mut image = [0u8; TOKEN_SIZE];
    for (i, b) in image.iter_mut().enumerate() {
        *b = (i * 7 + 3) as u8;
    }
    image
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Decrement a pending failure count, reporting whether this call fails
fn take_failure(counts: &mut HashMap<u8, usize>, key: u8) -> bool {
    match counts.get_mut(&key) {
        Some(n) if *n > 0 => {
            *n -= 1;
            true
        }
        _ => false,
    }
}

// PowerSaves ---------------------------------------------------------------

const PORTAL_PACKET: usize = 64;
const PORTAL_NAME: &[u8] = b"PowerSaves Portal";
const PORTAL_HARDWARE: &[u8] = &[0x01, 0x04, 0x00];
const PORTAL_PASSWORD: &[u8] = b"0123456789abcdef";

#[derive(Debug)]
struct PortalState {
    token: Option<[u8; TOKEN_SIZE]>,
    uid: [u8; 7],
    field: bool,
    led: bool,
    read_failures: HashMap<u8, usize>,
    write_failures: HashMap<u8, usize>,
    corrupt_pass: Option<usize>,
    passes: usize,
    reads: usize,
    writes: usize,
}

/// Simulated PowerSaves portal
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct PowerSavesSim {
    state: Arc<Mutex<PortalState>>,
}

impl Default for PowerSavesSim {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerSavesSim {
    /// Portal with an empty field
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PortalState {
                token: None,
                uid: [0x04, 0xa1, 0xb2, 0xc3, 0xd4, 0xe5, 0x80],
                field: false,
                led: false,
                read_failures: HashMap::new(),
                write_failures: HashMap::new(),
                corrupt_pass: None,
                passes: 0,
                reads: 0,
                writes: 0,
            })),
        }
    }

    pub fn with_token(image: [u8; TOKEN_SIZE]) -> Self {
        let sim = Self::new();
        sim.place_token(image);
        sim
    }

    /// Transport answering like the portal
    pub fn transport(&self) -> MockTransport {
        let state = Arc::clone(&self.state);
        MockTransport::with_responder(move |frame| Some(answer_portal(&mut lock(&state), frame)))
    }

    pub fn place_token(&self, image: [u8; TOKEN_SIZE]) {
        lock(&self.state).token = Some(image);
    }

    pub fn remove_token(&self) {
        lock(&self.state).token = None;
    }

    pub fn token(&self) -> Option<[u8; TOKEN_SIZE]> {
        lock(&self.state).token
    }

    pub fn uid(&self) -> [u8; 7] {
        lock(&self.state).uid
    }

    pub fn led(&self) -> bool {
        lock(&self.state).led
    }

    pub fn field(&self) -> bool {
        lock(&self.state).field
    }

    /// READ_PAGES requests answered so far, failed ones included
    pub fn reads(&self) -> usize {
        lock(&self.state).reads
    }

    pub fn writes(&self) -> usize {
        lock(&self.state).writes
    }

    /// Make the next `times` reads of the chunk starting at `page` fail
    pub fn fail_reads(&self, page: u8, times: usize) {
        lock(&self.state).read_failures.insert(page, times);
    }

    pub fn fail_writes(&self, page: u8, times: usize) {
        lock(&self.state).write_failures.insert(page, times);
    }

    /// Flip data during read pass `pass` (1-based)
    pub fn corrupt_pass(&self, pass: usize) {
        lock(&self.state).corrupt_pass = Some(pass);
    }
}

fn portal_packet(body: &[u8]) -> Vec<u8> {
    let mut packet = body.to_vec();
    packet.resize(PORTAL_PACKET.max(body.len()), FILLER);
    packet
}

fn portal_error() -> Vec<u8> {
    portal_packet(&crate::constants::ERROR_MARKER)
}

fn answer_portal(s: &mut PortalState, frame: &[u8]) -> Vec<u8> {
    let Some((&opcode, args)) = frame.split_first() else {
        return portal_error();
    };
    match opcode {
        ps::GET_DEVICE_NAME => portal_packet(PORTAL_NAME),
        ps::GET_HARDWARE_INFO => portal_packet(PORTAL_HARDWARE),
        ps::GET_API_PASSWORD => portal_packet(PORTAL_PASSWORD),
        ps::SET_LED => {
            s.led = args.first().is_some_and(|&b| b != 0);
            portal_packet(&[])
        }
        ps::FIELD_ON => {
            s.field = true;
            portal_packet(&[])
        }
        ps::FIELD_OFF => {
            s.field = false;
            portal_packet(&[])
        }
        ps::GET_TOKEN_UID => match s.token {
            Some(_) if s.field => portal_packet(&s.uid),
            _ => portal_error(),
        },
        ps::READ_PAGES => {
            s.reads += 1;
            let page = args.first().copied().unwrap_or(0);
            if take_failure(&mut s.read_failures, page) {
                return portal_error();
            }
            let Some(image) = s.token else {
                return portal_error();
            };
            if page == 0 {
                s.passes += 1;
            }
            let mut chunk = [0u8; ps::READ_CHUNK];
            let offset = page as usize * PAGE_SIZE;
            for (i, b) in chunk.iter_mut().enumerate() {
                *b = image.get(offset + i).copied().unwrap_or(0);
            }
            if s.corrupt_pass == Some(s.passes) {
                chunk[ps::READ_CHUNK - 1] ^= 0xff;
            }
            portal_packet(&chunk)
        }
        ps::WRITE_PAGE => {
            s.writes += 1;
            let page = args.first().copied().unwrap_or(0);
            if take_failure(&mut s.write_failures, page) || args.len() < 1 + PAGE_SIZE {
                return portal_error();
            }
            let offset = page as usize * PAGE_SIZE;
            match s.token.as_mut() {
                Some(image) if offset + PAGE_SIZE <= TOKEN_SIZE => {
                    image[offset..offset + PAGE_SIZE].copy_from_slice(&args[1..1 + PAGE_SIZE]);
                    portal_packet(&[])
                }
                _ => portal_error(),
            }
        }
        _ => portal_error(),
    }
}

// MFRC522 ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PiccState {
    Idle,
    Ready,
    Active,
    Halt,
}

/// Simulated token in the field of an [`Mfrc522Sim`]
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct SimPicc {
    uid: Vec<u8>,
    state: PiccState,
    level: usize,
    banks: BTreeMap<u8, Vec<u8>>,
    unlocked: bool,
    refuse_unlock: bool,
    bad_bcc: bool,
    bad_sak_crc: bool,
}

impl SimPicc {
    /// Token with a 4, 7 or 10 byte UID and zeroed banks
    pub fn new(uid: &[u8]) -> Self {
        Self {
            uid: uid.to_vec(),
            state: PiccState::Idle,
            level: 0,
            banks: BTreeMap::new(),
            unlocked: false,
            refuse_unlock: false,
            bad_bcc: false,
            bad_sak_crc: false,
        }
    }

    pub fn with_bank(mut self, bank: u8, data: [u8; n2::BANK_SIZE]) -> Self {
        self.banks.insert(bank, data.to_vec());
        self
    }

    pub fn refusing_unlock(mut self) -> Self {
        self.refuse_unlock = true;
        self
    }

    pub fn with_bad_bcc(mut self) -> Self {
        self.bad_bcc = true;
        self
    }

    pub fn with_bad_sak_crc(mut self) -> Self {
        self.bad_sak_crc = true;
        self
    }

    fn levels(&self) -> usize {
        match self.uid.len() {
            4 => 1,
            7 => 2,
            _ => 3,
        }
    }

    /// UID part and BCC transmitted on cascade `level`
    fn cascade_level(&self, level: usize) -> [u8; 5] {
        let mut out = [0u8; 5];
        let start = 3 * level;
        if level + 1 < self.levels() {
            out[0] = crate::constants::CASCADE_TAG;
            out[1..4].copy_from_slice(&self.uid[start..start + 3]);
        } else {
            out[..4].copy_from_slice(&self.uid[start..start + 4]);
        }
        out[4] = crate::protocol::bcc(&out[..4]) ^ if self.bad_bcc { 0xff } else { 0 };
        out
    }

    fn bank_mut(&mut self, bank: u8) -> &mut Vec<u8> {
        self.banks
            .entry(bank)
            .or_insert_with(|| vec![0; n2::BANK_SIZE])
    }

    fn power_off(&mut self) {
        self.state = PiccState::Idle;
        self.level = 0;
        self.unlocked = false;
    }

    fn challenge(&self) -> [u8; 4] {
        [self.uid[0] ^ 0x5a, self.uid[1] ^ 0xa5, 0x3c, 0xc3]
    }
}

/// What the field answered to one transmission
enum Reply {
    Silence,
    Data { bytes: Vec<u8>, last_bits: u8 },
    Collision { bytes: Vec<u8>, position: usize },
}

fn bit(bytes: &[u8], index: usize) -> u8 {
    (bytes[index / 8] >> (index % 8)) & 1
}

#[derive(Debug)]
struct ChipState {
    regs: [u8; 64],
    fifo: Vec<u8>,
    piccs: Vec<SimPicc>,
    antenna_jammed: bool,
    collisions: usize,
    bank_reads: usize,
    bank_failures: usize,
}

const CHIP_VERSION: u8 = 0x92;
const TX_CONTROL_RESET: u8 = 0x80;

impl ChipState {
    fn new() -> Self {
        let mut regs = [0u8; 64];
        regs[n2::reg::TX_CONTROL as usize] = TX_CONTROL_RESET;
        regs[n2::reg::VERSION as usize] = CHIP_VERSION;
        Self {
            regs,
            fifo: Vec::new(),
            piccs: Vec::new(),
            antenna_jammed: false,
            collisions: 0,
            bank_reads: 0,
            bank_failures: 0,
        }
    }

    fn reg(&self, address: u8) -> u8 {
        self.regs[(address & 0x3f) as usize]
    }

    fn set_reg(&mut self, address: u8, value: u8) {
        self.regs[(address & 0x3f) as usize] = value;
    }

    fn antenna_on(&self) -> bool {
        self.reg(n2::reg::TX_CONTROL) & n2::ANTENNA_ON == n2::ANTENNA_ON
    }

    fn power_off_field(&mut self) {
        self.piccs.iter_mut().for_each(SimPicc::power_off);
    }

    fn read(&mut self, address: u8) -> u8 {
        match address {
            n2::reg::FIFO_DATA => {
                if self.fifo.is_empty() {
                    0
                } else {
                    self.fifo.remove(0)
                }
            }
            n2::reg::FIFO_LEVEL => self.fifo.len() as u8,
            other => self.reg(other),
        }
    }

    fn write(&mut self, address: u8, data: &[u8]) {
        let Some(&value) = data.last() else {
            return;
        };
        match address {
            n2::reg::COMMAND => {
                if value & 0x0f == n2::cmd::SOFT_RESET {
                    self.regs = ChipState::new().regs;
                    self.fifo.clear();
                    self.power_off_field();
                } else {
                    self.set_reg(address, value);
                }
            }
            n2::reg::COM_IRQ => {
                let current = self.reg(address);
                let mask = value & 0x7f;
                let next = if value & 0x80 != 0 {
                    current | mask
                } else {
                    current & !mask
                };
                self.set_reg(address, next);
            }
            n2::reg::FIFO_LEVEL => {
                if value & n2::FLUSH_BUFFER != 0 {
                    self.fifo.clear();
                }
            }
            n2::reg::FIFO_DATA => self.fifo.extend_from_slice(data),
            n2::reg::BIT_FRAMING => {
                self.set_reg(address, value);
                if value & n2::START_SEND != 0
                    && self.reg(n2::reg::COMMAND) & 0x0f == n2::cmd::TRANSCEIVE
                {
                    self.transmit();
                }
            }
            n2::reg::TX_CONTROL => {
                let value = if self.antenna_jammed {
                    value & !n2::ANTENNA_ON
                } else {
                    value
                };
                self.set_reg(address, value);
                if value & n2::ANTENNA_ON == 0 {
                    self.power_off_field();
                }
            }
            n2::reg::VERSION => {}
            other => self.set_reg(other, value),
        }
    }

    fn transmit(&mut self) {
        let tx = std::mem::take(&mut self.fifo);
        let framing = self.reg(n2::reg::BIT_FRAMING);
        let tx_last_bits = framing & 0x07;

        self.set_reg(n2::reg::ERROR, 0);
        self.set_reg(n2::reg::COLL, 0);
        let control = self.reg(n2::reg::CONTROL) & !0x07;
        self.set_reg(n2::reg::CONTROL, control);

        let reply = if self.antenna_on() {
            self.exchange(&tx, tx_last_bits)
        } else {
            Reply::Silence
        };

        let irq = self.reg(n2::reg::COM_IRQ);
        match reply {
            Reply::Silence => self.set_reg(n2::reg::COM_IRQ, irq | n2::IRQ_TIMER),
            Reply::Data { bytes, last_bits } => {
                self.fifo = bytes;
                self.set_reg(n2::reg::CONTROL, control | (last_bits & 0x07));
                self.set_reg(n2::reg::COM_IRQ, irq | n2::IRQ_DONE);
            }
            Reply::Collision { bytes, position } => {
                self.collisions += 1;
                self.fifo = bytes;
                self.set_reg(n2::reg::ERROR, n2::ERR_COLLISION);
                self.set_reg(n2::reg::COLL, (position & 0x1f) as u8);
                self.set_reg(n2::reg::COM_IRQ, irq | n2::IRQ_DONE);
            }
        }
    }

    fn exchange(&mut self, tx: &[u8], tx_last_bits: u8) -> Reply {
        let Some(&code) = tx.first() else {
            return Reply::Silence;
        };

        if tx.len() == 1 && tx_last_bits == n2::SHORT_FRAME_BITS {
            return self.request(code);
        }
        if let Some(level) = SELECT_CODES.iter().position(|&c| c == code) {
            return match tx.get(1) {
                Some(&n2::NVB_SELECT) => self.select(level, tx),
                Some(&nvb) => self.anticollision(level, nvb, &tx[2..]),
                None => Reply::Silence,
            };
        }
        if code == n2::PICC_HLTA {
            for p in self.piccs.iter_mut() {
                if matches!(p.state, PiccState::Ready | PiccState::Active) {
                    p.state = PiccState::Halt;
                    p.unlocked = false;
                }
            }
            return Reply::Silence;
        }

        let failing = matches!(code, n2::PICC_READ_BANK | n2::PICC_WRITE_BANK) && self.bank_failures > 0;
        if failing {
            self.bank_failures -= 1;
            return Reply::Silence;
        }
        let Some(picc) = self
            .piccs
            .iter_mut()
            .find(|p| p.state == PiccState::Active)
        else {
            return Reply::Silence;
        };

        match code {
            n2::PICC_UNLOCK_1 => Reply::Data {
                bytes: picc.challenge().to_vec(),
                last_bits: 0,
            },
            n2::PICC_UNLOCK_2 => {
                let ok = !picc.refuse_unlock && tx.get(1..) == Some(&picc.challenge()[..]);
                picc.unlocked = ok;
                Reply::Data {
                    bytes: if ok { n2::UNLOCK_ACK.to_vec() } else { vec![0, 0] },
                    last_bits: 0,
                }
            }
            n2::PICC_READ_BANK if picc.unlocked => {
                let Ok(payload) = strip_crc_a(tx) else {
                    return Reply::Silence;
                };
                let &[_, start, end, bank] = payload else {
                    return Reply::Silence;
                };
                let (from, to) = (start as usize * PAGE_SIZE, (end as usize + 1) * PAGE_SIZE);
                if end < start || to > n2::BANK_SIZE {
                    return Reply::Silence;
                }
                let mut bytes = picc.bank_mut(bank)[from..to].to_vec();
                append_crc_a(&mut bytes);
                self.bank_reads += 1;
                Reply::Data { bytes, last_bits: 0 }
            }
            n2::PICC_WRITE_BANK if picc.unlocked => {
                let Ok(payload) = strip_crc_a(tx) else {
                    return Reply::Silence;
                };
                let [_, start, count, bank, data @ ..] = payload else {
                    return Reply::Silence;
                };
                let from = *start as usize * PAGE_SIZE;
                let to = from + *count as usize * PAGE_SIZE;
                if data.len() != to - from || to > n2::BANK_SIZE {
                    return Reply::Silence;
                }
                picc.bank_mut(*bank)[from..to].copy_from_slice(data);
                Reply::Data {
                    bytes: vec![n2::PICC_ACK],
                    last_bits: 4,
                }
            }
            _ => Reply::Silence,
        }
    }

    fn request(&mut self, code: u8) -> Reply {
        let wakeup = match code {
            n2::PICC_REQA => false,
            n2::PICC_WUPA => true,
            _ => return Reply::Silence,
        };
        let mut answered = false;
        for p in self.piccs.iter_mut() {
            if p.state == PiccState::Idle || (wakeup && p.state == PiccState::Halt) {
                p.state = PiccState::Ready;
                p.level = 0;
                answered = true;
            }
        }
        if answered {
            Reply::Data {
                bytes: vec![0x44, 0x00],
                last_bits: 0,
            }
        } else {
            Reply::Silence
        }
    }

    fn anticollision(&mut self, level: usize, nvb: u8, known: &[u8]) -> Reply {
        let known_bits = ((nvb >> 4) as usize).saturating_sub(2) * 8 + (nvb & 0x0f) as usize;
        if known_bits > 32 || known.len() * 8 < known_bits {
            return Reply::Silence;
        }

        let answers: Vec<[u8; 5]> = self
            .piccs
            .iter()
            .filter(|p| p.state == PiccState::Ready && p.level == level)
            .map(|p| p.cascade_level(level))
            .filter(|cl| (0..known_bits).all(|i| bit(cl, i) == bit(known, i)))
            .collect();
        let Some(first) = answers.first() else {
            return Reply::Silence;
        };

        let start = known_bits / 8;
        let collision = (known_bits..40).find(|&i| answers.iter().any(|cl| bit(cl, i) != bit(first, i)));
        match collision {
            None => Reply::Data {
                bytes: first[start..].to_vec(),
                last_bits: 0,
            },
            Some(at) => {
                let mut bytes = first.to_vec();
                for i in at..40 {
                    bytes[i / 8] &= !(1 << (i % 8));
                }
                Reply::Collision {
                    bytes: bytes[start..].to_vec(),
                    position: at + 1,
                }
            }
        }
    }

    fn select(&mut self, level: usize, tx: &[u8]) -> Reply {
        let Ok(payload) = strip_crc_a(tx) else {
            return Reply::Silence;
        };
        let Some(target) = payload.get(2..7) else {
            return Reply::Silence;
        };

        let mut answer = None;
        for p in self.piccs.iter_mut() {
            if p.state != PiccState::Ready || p.level != level {
                continue;
            }
            if p.cascade_level(level)[..] != target[..] {
                p.state = PiccState::Idle;
                continue;
            }
            let sak = if level + 1 < p.levels() {
                p.level += 1;
                n2::SAK_CASCADE
            } else {
                p.state = PiccState::Active;
                0x00
            };
            answer = Some((sak, p.bad_sak_crc));
        }

        match answer {
            Some((sak, bad_crc)) => {
                let mut bytes = vec![sak];
                append_crc_a(&mut bytes);
                if bad_crc {
                    bytes[1] ^= 0xff;
                }
                Reply::Data { bytes, last_bits: 0 }
            }
            None => Reply::Silence,
        }
    }
}

/// Simulated MFRC522 with tokens in its field
#[doc(hidden)]
#[derive(Debug, Clone)]
pub struct Mfrc522Sim {
    state: Arc<Mutex<ChipState>>,
}

impl Default for Mfrc522Sim {
    fn default() -> Self {
        Self::new()
    }
}

impl Mfrc522Sim {
    /// Chip with an empty field
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChipState::new())),
        }
    }

    /// Transport speaking the register protocol of the chip
    pub fn transport(&self) -> MockTransport {
        let state = Arc::clone(&self.state);
        MockTransport::with_responder(move |frame| {
            let (&address, data) = frame.split_first()?;
            let mut chip = lock(&state);
            if address & crate::protocol::RegisterFrame::READ_FLAG != 0 {
                Some(vec![chip.read(address & 0x3f)])
            } else {
                chip.write(address & 0x3f, data);
                None
            }
        })
    }

    pub fn add_picc(&self, picc: SimPicc) {
        lock(&self.state).piccs.push(picc);
    }

    /// Remove every token from the field
    pub fn clear_field(&self) {
        lock(&self.state).piccs.clear();
    }

    /// Keep the antenna drivers from switching on
    pub fn jam_antenna(&self) {
        lock(&self.state).antenna_jammed = true;
    }

    /// Make the next `n` bank requests go unanswered
    pub fn fail_bank_requests(&self, n: usize) {
        lock(&self.state).bank_failures = n;
    }

    pub fn register(&self, address: u8) -> u8 {
        lock(&self.state).reg(address)
    }

    pub fn collisions(&self) -> usize {
        lock(&self.state).collisions
    }

    /// Bank reads answered so far
    pub fn bank_reads(&self) -> usize {
        lock(&self.state).bank_reads
    }

    pub fn unlocked(&self, picc: usize) -> bool {
        lock(&self.state)
            .piccs
            .get(picc)
            .is_some_and(|p| p.unlocked)
    }

    /// Contents of `bank` on token `picc`
    pub fn bank(&self, picc: usize, bank: u8) -> Vec<u8> {
        let mut state = lock(&self.state);
        match state.piccs.get_mut(picc) {
            Some(p) => p.bank_mut(bank).clone(),
            None => Vec::new(),
        }
    }
}
