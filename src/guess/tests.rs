use super::*;
use crate::io::Method;
use crate::utils::tests::{closed_shell_batch, radical_batch, MockCollaborators};
use approx::AbsDiffEq;

fn options(mix_homo_lumo: bool, mix_coeff: f64) -> GuessOptions {
    GuessOptionsBuilder::default()
        .mix_homo_lumo(mix_homo_lumo)
        .mix_coeff(mix_coeff)
        .build()
        .unwrap()
}

fn channel_trace(p: &Array4<f64>, m: usize, spin: usize) -> f64 {
    p.slice(s![m, spin, .., ..]).diag().sum()
}

#[test]
fn default_options() {
    let options: GuessOptions = GuessOptionsBuilder::default().build().unwrap();
    assert_eq!(options, GuessOptions::default());
    assert!(!options.mix_homo_lumo);
    assert_eq!(options.mix_coeff, 0.4);
    assert!(!options.overwrite_existing_dm);
    assert!(!options.check_degeneracy);
}

#[test]
fn mixing_coefficient_is_validated() {
    assert!(GuessOptionsBuilder::default().mix_coeff(1.5).build().is_err());
    assert!(GuessOptionsBuilder::default()
        .degeneracy_tolerance(-1.0)
        .build()
        .is_err());

    let mocks = MockCollaborators::default();
    let invalid = GuessOptions {
        mix_coeff: -0.1,
        ..GuessOptions::default()
    };
    assert!(matches!(
        GuessBuilder::new(mocks.collaborators(), invalid),
        Err(GuessError::InvalidOption(_))
    ));
}

#[test]
fn closed_shell_batches_get_the_atomic_density() {
    let mocks = MockCollaborators::default();
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.4)).unwrap();
    let mut batch = closed_shell_batch(Method::AM1);

    let guess: GuessResult = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert!(guess.orbitals.is_none());
    assert!(guess.orbital_energies.is_none());
    assert_eq!(guess.density, atomic_density(&batch));
    assert_eq!(batch.dm.as_ref(), Some(&guess.density));
    assert_eq!(mocks.fock.saw_integrals.get(), None);
    assert_eq!(mocks.integrals.closed_shell_calls.get(), 0);
}

#[test]
fn cached_density_is_reused_unless_overwritten() {
    let mocks = MockCollaborators::default();
    let mut batch = closed_shell_batch(Method::AM1);
    let cached: DensityMatrix =
        DensityMatrix::Restricted(Array3::from_elem([2, batch.n_basis(), batch.n_basis()], 0.25));
    batch.dm = Some(cached.clone());

    let builder = GuessBuilder::new(mocks.collaborators(), GuessOptions::default()).unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert_eq!(guess.density, cached);
    assert_eq!(batch.dm.as_ref(), Some(&cached));

    let overwrite = GuessOptions {
        overwrite_existing_dm: true,
        ..GuessOptions::default()
    };
    let builder = GuessBuilder::new(mocks.collaborators(), overwrite).unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert_eq!(guess.density, atomic_density(&batch));
    assert_eq!(batch.dm.as_ref(), Some(&guess.density));
}

#[test]
fn mismatching_cached_density_is_rejected() {
    let mocks = MockCollaborators::default();
    let mut batch = radical_batch(Method::AM1);
    let cached: DensityMatrix = DensityMatrix::Restricted(Array3::zeros([2, 12, 12]));
    batch.dm = Some(cached.clone());
    let builder = GuessBuilder::new(mocks.collaborators(), GuessOptions::default()).unwrap();
    let result = builder.build(&mut batch, &LearnedParameters::default());
    assert!(matches!(result, Err(GuessError::Shape(_))));
    assert_eq!(batch.dm, Some(cached));
}

#[test]
fn open_shell_without_mixing_returns_the_seed() {
    let mocks = MockCollaborators::default();
    let builder = GuessBuilder::new(mocks.collaborators(), options(false, 0.4)).unwrap();
    let mut batch = radical_batch(Method::AM1);
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    assert_eq!(p.dim(), (2, 2, 12, 12));
    assert!(guess.orbitals.is_none());
    assert!(mocks.fock.saw_integrals.get().is_none());
}

#[test]
fn unmixed_guess_has_integer_occupations() {
    let mocks = MockCollaborators::default();
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.0)).unwrap();
    let mut batch = radical_batch(Method::AM1);
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert_eq!(mocks.fock.saw_integrals.get(), Some(false));

    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    let orbitals: Array4<f64> = guess.orbitals.unwrap();
    assert_eq!(orbitals.dim(), (2, 2, 6, 6));

    // OH: 4 alpha and 3 beta electrons, CH2: 4 alpha and 2 beta electrons
    let n_occ: Array2<usize> = batch.occupation.as_unrestricted().unwrap().clone();
    assert_eq!(n_occ, array![[4, 3], [4, 2]]);
    for m in 0..2 {
        for spin in 0..2 {
            assert!(channel_trace(p, m, spin).abs_diff_eq(&(2.0 * n_occ[[m, spin]] as f64), 1e-10));
        }
        // both channels see the same pseudo-Fock matrix, without mixing their orbitals agree
        assert_eq!(
            orbitals.slice(s![m, 0, .., ..]),
            orbitals.slice(s![m, 1, .., ..])
        );
    }
    // P = 2 C C^T of orthonormal orbitals is idempotent up to the factor 2
    let p_alpha: ArrayView2<f64> = p.slice(s![1, 0, .., ..]);
    assert!(p_alpha.dot(&p_alpha).abs_diff_eq(&(2.0 * &p_alpha), 1e-10));
}

#[test]
fn mixed_homo_contains_the_lumo() {
    let mocks = MockCollaborators::default();
    let mut batch = radical_batch(Method::AM1);
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.4)).unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    let orbitals: Array4<f64> = guess.orbitals.unwrap();

    for m in 0..2 {
        // the beta channel keeps the unmixed orbitals of the same matrix
        let beta = orbitals.slice(s![m, 1, .., ..]);
        let expected: Array1<f64> = 0.6 * &beta.column(3) + 0.4 * &beta.column(4);
        assert!(orbitals
            .slice(s![m, 0, .., 3])
            .abs_diff_eq(&expected, 1e-12));
        assert_eq!(orbitals.slice(s![m, 0, .., 4]), beta.column(4));
    }

    // 3 doubly occupied orbitals and the mixed HOMO with norm 0.6^2 + 0.4^2
    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    assert!(channel_trace(p, 0, 0).abs_diff_eq(&(6.0 + 2.0 * 0.52), 1e-10));
    assert_eq!(batch.dm.as_ref(), Some(&guess.density));
}

#[test]
fn single_orbital_radicals_are_not_mixed_with_padding() {
    let mocks = MockCollaborators::default();
    let mut batch = MoleculeBatch::new(
        Method::AM1,
        array![[1, 0, 0], [6, 1, 1]],
        array![
            [[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            [[0.0, 0.0, 0.0], [0.0, 0.99, 0.6], [0.0, -0.99, 0.6]]
        ],
        array![0, 0],
        array![2, 3],
    )
    .unwrap();
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.4)).unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    let orbitals: Array4<f64> = guess.orbitals.unwrap();

    // the hydrogen atom has no LUMO, its only electron stays in the s orbital
    assert!(channel_trace(p, 0, 0).abs_diff_eq(&2.0, 1e-10));
    assert!(channel_trace(p, 0, 1).abs_diff_eq(&0.0, 1e-10));
    assert!(p[[0, 0, 0, 0]].abs_diff_eq(&2.0, 1e-10));
    assert_eq!(
        orbitals.slice(s![0, 0, .., ..]),
        orbitals.slice(s![0, 1, .., ..])
    );
    // CH2 is mixed as usual
    assert!(channel_trace(p, 1, 0).abs_diff_eq(&(6.0 + 2.0 * 0.52), 1e-10));
}

#[test]
fn padding_never_enters_the_density() {
    let mocks = MockCollaborators::default();
    let mut batch = radical_batch(Method::AM1);
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.4)).unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    let energies: Array3<f64> = guess.orbital_energies.unwrap();
    assert_eq!(energies.dim(), (2, 2, 12));

    // OH has 5 physical orbitals, the padded sixth eigenvalue is dropped
    assert!(energies.slice(s![0, .., 5..]).iter().all(|&e| e == 0.0));
    assert!(energies.slice(s![1, .., 6..]).iter().all(|&e| e == 0.0));
    for m in 0..2 {
        for spin in 0..2 {
            let e = energies.slice(s![m, spin, ..5]);
            assert!(e.windows(2).into_iter().all(|w| w[0] <= w[1]));
        }
    }
    // unused p orbitals of hydrogen and the padding atom of OH
    for spin in 0..2 {
        assert!(p.slice(s![0, spin, 5..8, ..]).iter().all(|&x| x == 0.0));
        assert!(p.slice(s![0, spin, 8.., ..]).iter().all(|&x| x == 0.0));
        assert!(p.slice(s![1, spin, 5..8, ..]).iter().all(|&x| x == 0.0));
    }
}

#[test]
fn degeneracy_check_without_degeneracy_changes_nothing() {
    let mocks = MockCollaborators::default();
    let plain = GuessBuilder::new(mocks.collaborators(), options(true, 0.2)).unwrap();
    let mut batch = radical_batch(Method::AM1);
    let reference = plain.build(&mut batch, &LearnedParameters::default()).unwrap();

    let checked_options = GuessOptions {
        check_degeneracy: true,
        overwrite_existing_dm: true,
        ..options(true, 0.2)
    };
    let checked = GuessBuilder::new(mocks.collaborators(), checked_options).unwrap();
    let mut batch = radical_batch(Method::AM1);
    let guess = checked.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert!(guess
        .density
        .as_unrestricted()
        .unwrap()
        .abs_diff_eq(reference.density.as_unrestricted().unwrap(), 1e-10));
}

#[test]
fn d_orbital_density_is_halved() {
    let mocks = MockCollaborators::with_d_tables();
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.0)).unwrap();
    // SH radical: 4 alpha and 3 beta electrons in 9 + 1 orbitals
    let mut batch = MoleculeBatch::new(
        Method::PM6,
        array![[16, 1]],
        array![[[0.0, 0.0, 0.0], [0.0, 0.0, 1.34]]],
        array![0],
        array![2],
    )
    .unwrap();
    let guess = builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert_eq!(mocks.integrals.open_shell_calls.get(), 1);
    assert_eq!(mocks.fock.saw_integrals.get(), Some(true));

    let p: &Array4<f64> = guess.density.as_unrestricted().unwrap();
    assert_eq!(p.dim(), (1, 2, 18, 18));
    assert!(channel_trace(p, 0, 0).abs_diff_eq(&4.0, 1e-10));
    assert!(channel_trace(p, 0, 1).abs_diff_eq(&3.0, 1e-10));
    assert_eq!(guess.orbitals.unwrap().dim(), (1, 2, 10, 10));
}

#[test]
fn closed_shell_d_methods_evaluate_coulomb_integrals() {
    let mocks = MockCollaborators::with_d_tables();
    let builder = GuessBuilder::new(mocks.collaborators(), GuessOptions::default()).unwrap();
    let mut batch = closed_shell_batch(Method::PM6);
    builder.build(&mut batch, &LearnedParameters::default()).unwrap();
    assert_eq!(mocks.integrals.closed_shell_calls.get(), 1);
    assert_eq!(mocks.integrals.open_shell_calls.get(), 0);
}

#[test]
fn d_methods_need_d_parameters() {
    let mocks = MockCollaborators::default();
    let builder = GuessBuilder::new(mocks.collaborators(), GuessOptions::default()).unwrap();
    let mut batch = closed_shell_batch(Method::PM6);
    assert!(matches!(
        builder.build(&mut batch, &LearnedParameters::default()),
        Err(GuessError::MissingParameter(_))
    ));
}

#[test]
fn generated_parameters_see_the_batch() {
    let mocks = MockCollaborators::default();
    let builder = GuessBuilder::new(mocks.collaborators(), GuessOptions::default()).unwrap();
    let mut batch = radical_batch(Method::AM1);
    let learned = LearnedParameters::Generated(Box::new(|species: ArrayView2<u8>, _coordinates: ArrayView3<f64>| {
        let n_atoms: usize = species.iter().filter(|&&z| z != 0).count();
        let mut map = ParameterMap::new();
        map.insert(String::from("U_ss"), Array1::from_elem(n_atoms, -3.0));
        map
    }));
    builder.build(&mut batch, &learned).unwrap();
    let seen: ParameterMap = mocks.packer.last_learned.borrow().clone().unwrap();
    assert_eq!(seen["U_ss"], Array1::from_elem(5, -3.0));

    // overrides that do not fit the batch are reported by the packer
    let mut wrong = ParameterMap::new();
    wrong.insert(String::from("U_pp"), Array1::zeros(2));
    assert!(matches!(
        builder.build(&mut batch, &LearnedParameters::Fixed(wrong)),
        Err(GuessError::Collaborator(_))
    ));
}

#[test]
fn flaky_eigensolver_is_retried_once() {
    let mut mocks = MockCollaborators::default();
    mocks.eigensolver = crate::utils::tests::FlakyEigensolver::failing(1);
    let builder = GuessBuilder::new(mocks.collaborators(), options(true, 0.4)).unwrap();
    let mut batch = radical_batch(Method::AM1);
    assert!(builder.build(&mut batch, &LearnedParameters::default()).is_ok());
    assert_eq!(mocks.eigensolver.calls(), 2);
}
