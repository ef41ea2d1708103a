// ============================================================
// Layer 5 — Bidirectional LSTM Encoder
// ============================================================
// Two independent LSTM cells read the embedded sequence, one
// left-to-right and one right-to-left, and their per-timestep
// outputs are concatenated along the feature axis.
//
// Variable lengths inside a fixed-shape batch are handled with
// a state-freeze mask. For row b and step t:
//
//   m      = 1 if t < length[b] else 0
//   c_t    = c_prev + m * (c̃_t - c_prev)
//   h_t    = h_prev + m * (h̃_t - h_prev)
//   out_t  = m * h̃_t
//
// Forward direction: once a row runs out of tokens its state is
// frozen and its outputs are zero.
//
// Backward direction: the cell walks from the last column to the
// first. A row's state stays at the zero initial state through
// its padding and only starts updating at its last real token,
// which is the same as reversing each row within its own length.
//
// Gate layout per step (hidden size H, 4H pre-activations):
//   i = σ(·)            input gate
//   g = tanh(·)         candidate
//   f = σ(· + 1.0)      forget gate, biased towards remembering
//   o = σ(·)            output gate
//   c̃ = f ⊙ c + i ⊙ g,  h̃ = o ⊙ tanh(c̃)

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig},
    prelude::*,
    tensor::activation,
};

#[derive(Config, Debug)]
pub struct LstmCellConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
    #[config(default = 1.0)]
    pub forget_bias: f64,
}

impl LstmCellConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> LstmCell<B> {
        let d_gates = 4 * self.d_hidden;
        let glorot  = Initializer::XavierUniform { gain: 1.0 };

        let mut input_gates = LinearConfig::new(self.d_input, d_gates)
            .with_initializer(glorot.clone())
            .init(device);
        input_gates.bias = Some(Param::from_tensor(Tensor::zeros([d_gates], device)));

        let hidden_gates = LinearConfig::new(self.d_hidden, d_gates)
            .with_bias(false)
            .with_initializer(glorot)
            .init(device);

        LstmCell {
            input_gates,
            hidden_gates,
            d_hidden:    self.d_hidden,
            forget_bias: self.forget_bias,
        }
    }
}

#[derive(Module, Debug)]
pub struct LstmCell<B: Backend> {
    pub input_gates:  Linear<B>,
    pub hidden_gates: Linear<B>,
    pub d_hidden:     usize,
    pub forget_bias:  f64,
}

/// Cell and hidden state, both [batch, hidden].
#[derive(Debug, Clone)]
pub struct CellState<B: Backend> {
    pub cell:   Tensor<B, 2>,
    pub hidden: Tensor<B, 2>,
}

impl<B: Backend> CellState<B> {
    pub fn zeros(batch_size: usize, d_hidden: usize, device: &B::Device) -> Self {
        Self {
            cell:   Tensor::zeros([batch_size, d_hidden], device),
            hidden: Tensor::zeros([batch_size, d_hidden], device),
        }
    }
}

impl<B: Backend> LstmCell<B> {
    /// One unmasked step: x [batch, d_input] → new state.
    pub fn step(&self, x: Tensor<B, 2>, state: &CellState<B>) -> CellState<B> {
        let [batch_size, _] = x.dims();
        let h = self.d_hidden;

        let gates = self.input_gates.forward(x)
            + self.hidden_gates.forward(state.hidden.clone());
        let gate  = |k: usize| gates.clone().slice([0..batch_size, k * h..(k + 1) * h]);

        let input_gate  = activation::sigmoid(gate(0));
        let candidate   = gate(1).tanh();
        let forget_gate = activation::sigmoid(gate(2).add_scalar(self.forget_bias));
        let output_gate = activation::sigmoid(gate(3));

        let cell   = forget_gate * state.cell.clone() + input_gate * candidate;
        let hidden = output_gate * cell.clone().tanh();
        CellState { cell, hidden }
    }

    /// One masked step. `mask` is [batch, hidden] of 0/1.
    /// Returns the next state and this step's output.
    pub fn masked_step(
        &self,
        x:     Tensor<B, 2>,
        state: &CellState<B>,
        mask:  Tensor<B, 2>,
    ) -> (CellState<B>, Tensor<B, 2>) {
        let next   = self.step(x, state);
        let output = next.hidden.clone() * mask.clone();
        let cell   = state.cell.clone()   + (next.cell   - state.cell.clone())   * mask.clone();
        let hidden = state.hidden.clone() + (next.hidden - state.hidden.clone()) * mask;
        (CellState { cell, hidden }, output)
    }

    /// Run over a whole [batch, seq, d_input] sequence.
    /// `valid` is the [batch, seq] 0/1 step mask; `reverse` walks right to left.
    /// Output is [batch, seq, hidden] in original time order.
    pub fn run(&self, inputs: Tensor<B, 3>, valid: Tensor<B, 2>, reverse: bool) -> Tensor<B, 3> {
        let [batch_size, seq_len, d_input] = inputs.dims();
        let device = inputs.device();

        let mut state   = CellState::zeros(batch_size, self.d_hidden, &device);
        let mut outputs = Vec::with_capacity(seq_len);

        let steps: Vec<usize> = if reverse {
            (0..seq_len).rev().collect()
        } else {
            (0..seq_len).collect()
        };

        for t in steps {
            let x = inputs.clone()
                .slice([0..batch_size, t..t + 1, 0..d_input])
                .reshape([batch_size, d_input]);
            let mask = valid.clone()
                .slice([0..batch_size, t..t + 1])
                .expand([batch_size, self.d_hidden]);

            let (next, output) = self.masked_step(x, &state, mask);
            state = next;
            outputs.push(output);
        }

        if reverse {
            outputs.reverse();
        }
        Tensor::stack::<3>(outputs, 1)
    }
}

// ─── BiEncoder ────────────────────────────────────────────────────────────────

#[derive(Config, Debug)]
pub struct BiEncoderConfig {
    pub d_input:  usize,
    pub d_hidden: usize,
}

impl BiEncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> BiEncoder<B> {
        let cell = LstmCellConfig::new(self.d_input, self.d_hidden);
        BiEncoder {
            forward_cell:  cell.init(device),
            backward_cell: cell.init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct BiEncoder<B: Backend> {
    pub forward_cell:  LstmCell<B>,
    pub backward_cell: LstmCell<B>,
}

/// Per-direction encoder outputs, each [batch, seq, hidden].
#[derive(Debug, Clone)]
pub struct BiEncoderOutput<B: Backend> {
    pub forward:  Tensor<B, 3>,
    pub backward: Tensor<B, 3>,
}

impl<B: Backend> BiEncoderOutput<B> {
    /// [batch, seq, 2 * hidden]: forward features first, then backward.
    pub fn concat(self) -> Tensor<B, 3> {
        Tensor::cat(vec![self.forward, self.backward], 2)
    }
}

impl<B: Backend> BiEncoder<B> {
    /// embedded: [batch, seq, d_input], lengths: [batch] → both directions.
    pub fn forward(&self, embedded: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> BiEncoderOutput<B> {
        let [_, seq_len, _] = embedded.dims();
        let valid = step_mask(lengths, seq_len);

        BiEncoderOutput {
            forward:  self.forward_cell.run(embedded.clone(), valid.clone(), false),
            backward: self.backward_cell.run(embedded, valid, true),
        }
    }
}

/// [batch, seq] float mask, 1 where `t < lengths[b]`.
pub fn step_mask<B: Backend>(lengths: Tensor<B, 1, Int>, seq_len: usize) -> Tensor<B, 2> {
    let [batch_size] = lengths.dims();
    let positions = Tensor::<B, 1, Int>::arange(0..seq_len as i64, &lengths.device())
        .reshape([1, seq_len])
        .expand([batch_size, seq_len]);
    let lengths = lengths.reshape([batch_size, 1]).expand([batch_size, seq_len]);
    positions.lower(lengths).float()
}

/// For each row, the feature vector at its final valid step.
///
/// outputs: [batch, seq, features], lengths: [batch] with every entry ≥ 1
/// → [batch, features]. Row i is `outputs[i, lengths[i] - 1, :]`.
pub fn last_valid_step<B: Backend>(outputs: Tensor<B, 3>, lengths: Tensor<B, 1, Int>) -> Tensor<B, 2> {
    let [batch_size, _, features] = outputs.dims();
    let index = lengths
        .sub_scalar(1)
        .reshape([batch_size, 1, 1])
        .expand([batch_size, 1, features]);
    outputs.gather(1, index).reshape([batch_size, features])
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    fn to_vec(t: Tensor<TestBackend, 2>) -> Vec<f32> {
        t.into_data().convert::<f32>().to_vec::<f32>().unwrap()
    }

    fn lengths(values: &[i32]) -> Tensor<TestBackend, 1, Int> {
        Tensor::from_ints(values, &Default::default())
    }

    #[test]
    fn test_step_mask() {
        let mask = step_mask(lengths(&[3, 1]), 4);
        assert_eq!(to_vec(mask), vec![1., 1., 1., 0., 1., 0., 0., 0.]);
    }

    #[test]
    fn test_last_valid_step_picks_length_minus_one() {
        let device = Default::default();
        // outputs[b, t, f] = 100 * b + 10 * t + f
        let values: Vec<f32> = (0..2)
            .flat_map(|b| (0..4).flat_map(move |t| (0..3).map(move |f| (100 * b + 10 * t + f) as f32)))
            .collect();
        let outputs = Tensor::<TestBackend, 1>::from_floats(values.as_slice(), &device).reshape([2, 4, 3]);

        let selected = last_valid_step(outputs, lengths(&[3, 1]));
        assert_eq!(selected.dims(), [2, 3]);
        // row 0 at t=2, row 1 at t=0
        assert_eq!(to_vec(selected), vec![20., 21., 22., 100., 101., 102.]);
    }

    #[test]
    fn test_encoder_output_shape() {
        let device  = Default::default();
        let encoder = BiEncoderConfig::new(4, 3).init::<TestBackend>(&device);
        let embedded = Tensor::<TestBackend, 3>::ones([2, 5, 4], &device);

        let out = encoder.forward(embedded, lengths(&[5, 2]));
        assert_eq!(out.forward.dims(), [2, 5, 3]);
        assert_eq!(out.backward.dims(), [2, 5, 3]);
        assert_eq!(out.concat().dims(), [2, 5, 6]);
    }

    #[test]
    fn test_padded_steps_produce_zero_output() {
        let device  = Default::default();
        let encoder = BiEncoderConfig::new(2, 3).init::<TestBackend>(&device);
        let embedded = Tensor::<TestBackend, 3>::ones([1, 4, 2], &device);

        let out = encoder.forward(embedded, lengths(&[2]));
        for direction in [out.forward, out.backward] {
            let padded = to_vec(direction.slice([0..1, 2..4, 0..3]).reshape([2, 3]));
            assert!(padded.iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_padding_does_not_change_final_outputs() {
        // The same two real steps, once unpadded and once with two padding columns.
        let device  = Default::default();
        let encoder = BiEncoderConfig::new(2, 3).init::<TestBackend>(&device);

        let short = Tensor::<TestBackend, 1>::from_floats([0.5f32, -0.2, 0.1, 0.9].as_slice(), &device)
            .reshape([1, 2, 2]);
        let padded = Tensor::<TestBackend, 1>::from_floats(
            [0.5f32, -0.2, 0.1, 0.9, 7.0, 7.0, -3.0, 4.0].as_slice(), &device,
        ).reshape([1, 4, 2]);

        let a = last_valid_step(encoder.forward(short, lengths(&[2])).concat(), lengths(&[2]));
        let b = last_valid_step(encoder.forward(padded, lengths(&[2])).concat(), lengths(&[2]));

        for (x, y) in to_vec(a).iter().zip(to_vec(b)) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_backward_reads_each_row_reversed_within_its_length() {
        let device  = Default::default();
        let encoder = BiEncoderConfig::new(2, 3).init::<TestBackend>(&device);
        let steps   = [[0.5f32, -0.2], [0.1, 0.9], [-0.7, 0.3]];

        // three real steps followed by one padding column
        let padded: Vec<f32> = steps.iter().flatten().copied().chain([4.0, -4.0]).collect();
        let padded = Tensor::<TestBackend, 1>::from_floats(padded.as_slice(), &device).reshape([1, 4, 2]);
        let backward = encoder.forward(padded, lengths(&[3])).backward;

        // the same backward cell run left to right over the reversed row
        let reversed: Vec<f32> = steps.iter().rev().flatten().copied().collect();
        let reversed = Tensor::<TestBackend, 1>::from_floats(reversed.as_slice(), &device).reshape([1, 3, 2]);
        let expected = encoder.backward_cell.run(reversed, step_mask(lengths(&[3]), 3), false);

        for t in 0..3 {
            let got  = to_vec(backward.clone().slice([0..1, t..t + 1, 0..3]).reshape([1, 3]));
            let want = to_vec(expected.clone().slice([0..1, 2 - t..3 - t, 0..3]).reshape([1, 3]));
            for (x, y) in got.iter().zip(&want) {
                assert!((x - y).abs() < 1e-6, "step {t}: {got:?} != {want:?}");
            }
        }
    }
}
