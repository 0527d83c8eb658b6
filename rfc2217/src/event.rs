//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

use bytes::BytesMut;

///
/// `TelnetEvent` is one classified unit of the incoming telnet stream, as
/// produced by the decoder: either a plain data byte, or a protocol element
/// that never reaches the user-visible byte stream.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TelnetEvent {
    /// A data byte, with IAC doubling already collapsed.
    Data(u8),
    /// A telnet command other than negotiation or subnegotiation.
    Command(u8),
    /// An option negotiation: `(DO | DONT | WILL | WONT, option)`.
    Negotiation(u8, u8),
    /// A complete subnegotiation payload (the bytes between `IAC SB` and
    /// `IAC SE`, unescaped).
    Suboption(BytesMut),
}
